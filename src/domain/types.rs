// ==========================================
// 学校供餐分量分配系统 - 领域类型定义
// ==========================================
// 职责: 学校类别、份量规格、分配策略等值类型
// 存储格式: 与数据库文本列保持一致
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 学校类别 (School Category)
// ==========================================
// SD = 小学, SMP = 初中, SMA = 高中
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchoolCategory {
    Sd,  // 小学（大小两种份量）
    Smp, // 初中（仅大份）
    Sma, // 高中（仅大份）
}

impl SchoolCategory {
    /// 全部类别（用于构建策略表）
    pub const ALL: [SchoolCategory; 3] = [SchoolCategory::Sd, SchoolCategory::Smp, SchoolCategory::Sma];

    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            SchoolCategory::Sd => "SD",
            SchoolCategory::Smp => "SMP",
            SchoolCategory::Sma => "SMA",
        }
    }
}

impl fmt::Display for SchoolCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchoolCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SD" => Ok(SchoolCategory::Sd),
            "SMP" => Ok(SchoolCategory::Smp),
            "SMA" => Ok(SchoolCategory::Sma),
            other => Err(format!("unknown school category: {}", other)),
        }
    }
}

// ==========================================
// 份量规格 (Portion Size)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortionSize {
    Small, // 小份
    Large, // 大份
}

impl PortionSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortionSize::Small => "small",
            PortionSize::Large => "large",
        }
    }
}

impl fmt::Display for PortionSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PortionSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "small" => Ok(PortionSize::Small),
            "large" => Ok(PortionSize::Large),
            other => Err(format!("unknown portion size: {}", other)),
        }
    }
}

// ==========================================
// 分配策略 (Allocation Policy)
// ==========================================
// 由学校类别派生，决定一个学校可以落多少行、哪些规格
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationPolicy {
    /// 大小份均可（0/1/2 行，仅落非零规格）
    DualSize,
    /// 仅大份（恰好 1 行，small 必须为 0）
    SingleLarge,
}

impl AllocationPolicy {
    /// 是否允许小份
    pub fn allows_small(&self) -> bool {
        matches!(self, AllocationPolicy::DualSize)
    }

    /// 分组视图中展示的份量类型
    pub fn display_type(&self) -> PortionSizeType {
        match self {
            AllocationPolicy::DualSize => PortionSizeType::Mixed,
            AllocationPolicy::SingleLarge => PortionSizeType::Large,
        }
    }
}

impl fmt::Display for AllocationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationPolicy::DualSize => write!(f, "DUAL_SIZE"),
            AllocationPolicy::SingleLarge => write!(f, "SINGLE_LARGE"),
        }
    }
}

// ==========================================
// 分组视图份量类型 (Portion Size Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortionSizeType {
    Mixed,
    Large,
}

impl PortionSizeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortionSizeType::Mixed => "mixed",
            PortionSizeType::Large => "large",
        }
    }
}

impl fmt::Display for PortionSizeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
