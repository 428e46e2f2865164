// ==========================================
// 医院周排班系统 - 槽位枚举引擎
// ==========================================
// 职责: 推导目标周内需要决策的 (日期, 工作点) 槽位
// 红线: 封锁工作日与关闭工作点不进入自动排班;
//       已有人员的槽位绝不二次指派
// ==========================================

use crate::domain::plan::WeeklyPlanAssignment;
use crate::domain::types::SlotReason;
use crate::domain::workplace::{WeekdaySetting, Workplace};
use crate::engine::diagnostics::UnfilledSlot;
use chrono::{Datelike, Days, NaiveDate, Weekday};
use std::collections::HashMap;
use tracing::debug;

// ==========================================
// WeekBounds - 目标周区间
// ==========================================
// ISO 周,周一为首日
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekBounds {
    pub year: i32,
    pub week: u32,
    pub from: NaiveDate, // 周一
    pub to: NaiveDate,   // 周日
}

impl WeekBounds {
    /// 解析 (year, week) 为具体日期区间; 周号非法返回 None
    pub fn resolve(year: i32, week: u32) -> Option<WeekBounds> {
        let from = NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)?;
        Some(WeekBounds {
            year,
            week,
            from,
            to: from + Days::new(6),
        })
    }

    /// 第 weekday (1-7) 个工作日对应的日期
    pub fn date_of_weekday(&self, weekday: u32) -> NaiveDate {
        self.from + Days::new(u64::from(weekday - 1))
    }

    /// 判断日期是否落在周区间内
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// 该日期是"当月第几个该工作日" (1 起)
pub fn weekday_occurrence_in_month(date: NaiveDate) -> u32 {
    (date.day() - 1) / 7 + 1
}

// ==========================================
// OpenSlot - 待决策槽位
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenSlot {
    pub date: NaiveDate,
    pub weekday: u32,
    pub workplace_id: i64,
}

/// 槽位枚举输出
#[derive(Debug, Default)]
pub struct SlotEnumeration {
    /// 待决策槽位,按 (工作日, 工作点顺序) 有序
    pub open_slots: Vec<OpenSlot>,
    /// 人工封锁且无人员的槽位 (直接进入诊断,不尝试填充)
    pub locked_empty: Vec<UnfilledSlot>,
}

// ==========================================
// SlotEnumerator - 槽位枚举引擎
// ==========================================
pub struct SlotEnumerator {
    // 无状态引擎,不需要注入依赖
}

impl SlotEnumerator {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 枚举目标周的槽位
    ///
    /// # 参数
    /// - `bounds`: 目标周区间
    /// - `locked_weekdays`: 计划封锁的工作日 (整日跳过)
    /// - `workplaces`: 参与周排班的工作点 (已按确定性顺序排列)
    /// - `settings`: 逐工作日设置 (槽位存在的前提)
    /// - `existing`: 计划内既有排班记录
    /// - `skip_closed`: 关闭工作点硬规则开关
    ///
    /// 周期规则解析为显式匹配: 工作日一致且周期命中当日的
    /// 当月序数; 重叠设置已在边界被拒,热循环内不再裁决
    pub fn enumerate(
        &self,
        bounds: &WeekBounds,
        locked_weekdays: &[u32],
        workplaces: &[Workplace],
        settings: &[WeekdaySetting],
        existing: &[WeeklyPlanAssignment],
        skip_closed: bool,
    ) -> SlotEnumeration {
        // (工作点, 工作日) -> 设置
        let mut settings_by_slot: HashMap<(i64, u32), Vec<&WeekdaySetting>> = HashMap::new();
        for setting in settings {
            settings_by_slot
                .entry((setting.workplace_id, setting.weekday))
                .or_default()
                .push(setting);
        }

        // 槽位键 -> 既有记录
        let mut existing_by_slot: HashMap<(u32, i64), Vec<&WeeklyPlanAssignment>> = HashMap::new();
        for assignment in existing {
            existing_by_slot
                .entry(assignment.slot_key())
                .or_default()
                .push(assignment);
        }

        let mut enumeration = SlotEnumeration::default();

        for weekday in 1..=7u32 {
            // 步骤1: 封锁工作日整日跳过
            if locked_weekdays.contains(&weekday) {
                debug!(weekday, "工作日被封锁,跳过");
                continue;
            }

            let date = bounds.date_of_weekday(weekday);
            let occurrence = weekday_occurrence_in_month(date);

            for workplace in workplaces {
                // 步骤2: 查找周期命中的设置
                let setting = settings_by_slot
                    .get(&(workplace.workplace_id, weekday))
                    .and_then(|candidates| {
                        candidates
                            .iter()
                            .find(|s| s.recurrence.matches_occurrence(occurrence))
                    });

                let setting = match setting {
                    Some(s) => s,
                    None => continue, // 该日无设置 => 槽位不存在
                };

                // 步骤3: 关闭即权威,不算失败
                if setting.closed && skip_closed {
                    debug!(
                        workplace_id = workplace.workplace_id,
                        weekday,
                        reason = setting.closed_reason.as_deref().unwrap_or(""),
                        "工作点当日关闭,跳过槽位"
                    );
                    continue;
                }

                let slot_records = existing_by_slot
                    .get(&(weekday, workplace.workplace_id))
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);

                // 步骤5: 已有人员 => 绝不二次指派
                if slot_records.iter().any(|a| a.has_employee()) {
                    continue;
                }

                // 步骤4: 无人员的封锁 => 报告未填充,不尝试填充
                if slot_records.iter().any(|a| a.is_block_without_employee()) {
                    enumeration.locked_empty.push(UnfilledSlot {
                        date,
                        weekday,
                        workplace_id: workplace.workplace_id,
                        workplace_name: workplace.name.clone(),
                        reasons: vec![SlotReason::LockedEmpty],
                        candidates_blocked_by: vec![],
                        blocks_publish: false,
                    });
                    continue;
                }

                enumeration.open_slots.push(OpenSlot {
                    date,
                    weekday,
                    workplace_id: workplace.workplace_id,
                });
            }
        }

        enumeration
    }
}

impl Default for SlotEnumerator {
    fn default() -> Self {
        Self::new()
    }
}
