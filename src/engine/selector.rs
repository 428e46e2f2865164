// ==========================================
// 医院周排班系统 - 评分选择引擎
// ==========================================
// 职责: 对槽位内合格候选排序并挑选胜者
// 红线: 平分裁决必须确定 —— 姓、名字典序 (大小写无关),
//       再以员工ID兜底
// ==========================================

use crate::engine::candidates::NO_MATCH_SCORE;
use std::cmp::Ordering;

// ==========================================
// ScoredCandidate - 已评分候选
// ==========================================
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub employee_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub score: i32,
    pub priority_score: i32,
}

impl ScoredCandidate {
    /// 胜者得分处于保底线即为低优先级落位 (软违规)
    pub fn is_low_priority_match(&self) -> bool {
        self.priority_score <= NO_MATCH_SCORE
    }
}

// ==========================================
// CandidateSelector - 选择引擎
// ==========================================
pub struct CandidateSelector {
    // 无状态引擎,不需要注入依赖
}

impl CandidateSelector {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 排序并选出胜者
    ///
    /// 排序键:
    /// 1) score 降序
    /// 2) 姓 字典序 (大小写无关)
    /// 3) 名 字典序 (大小写无关)
    /// 4) 员工ID 升序
    pub fn select(&self, mut candidates: Vec<ScoredCandidate>) -> Option<ScoredCandidate> {
        candidates.sort_by(compare_candidates);
        candidates.into_iter().next()
    }
}

impl Default for CandidateSelector {
    fn default() -> Self {
        Self::new()
    }
}

fn compare_candidates(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| name_key(&a.last_name).cmp(&name_key(&b.last_name)))
        .then_with(|| name_key(&a.first_name).cmp(&name_key(&b.first_name)))
        .then_with(|| a.employee_id.cmp(&b.employee_id))
}

/// 姓名比较键 (去首尾空白,统一小写)
fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}
