//! 分类样本与分拣类别

use num_enum::TryFromPrimitive;
use std::fmt;

/// 分类器输出的一个样本
///
/// `class_id` 0 表示"无类别"，1..=4 对应 [`SortingCategory`]；
/// `probability` 为置信度百分比（0-100）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassificationSample {
    pub class_id: u8,
    pub probability: u8,
}

impl ClassificationSample {
    pub fn new(class_id: u8, probability: u8) -> Self {
        Self {
            class_id,
            probability,
        }
    }

    /// 对应的分拣类别（0 或超出范围时为 `None`）
    pub fn category(&self) -> Option<SortingCategory> {
        SortingCategory::try_from(self.class_id).ok()
    }
}

/// 分拣类别（即分拣 ID / 垃圾桶编号）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u8)]
pub enum SortingCategory {
    /// 可回收物
    Recyclable = 1,
    /// 有害垃圾
    Hazardous = 2,
    /// 厨余垃圾
    Kitchen = 3,
    /// 其它垃圾
    Other = 4,
}

impl SortingCategory {
    pub const ALL: [SortingCategory; 4] = [
        SortingCategory::Recyclable,
        SortingCategory::Hazardous,
        SortingCategory::Kitchen,
        SortingCategory::Other,
    ];

    /// 写入分拣寄存器的值
    pub fn sorting_id(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for SortingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortingCategory::Recyclable => "recyclable",
            SortingCategory::Hazardous => "hazardous",
            SortingCategory::Kitchen => "kitchen",
            SortingCategory::Other => "other",
        };
        write!(f, "{}({})", name, self.sorting_id())
    }
}
