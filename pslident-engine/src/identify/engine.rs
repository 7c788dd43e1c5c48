//! 自适应识别引擎
//! 每次回答都会裁剪候选集，并在幸存候选之间重算相对差异
use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};

use super::matching::MatchMode;
use super::query::{Convergence, Query, QueryPurpose, Step};
use super::selection::select_query;
use super::verification::verification_queue;
use crate::core::{PreparedVersion, RuleKind};
use crate::error::{CoreError, CoreResult};
use crate::preparer::relative::{recompute_relative_changes, FirstVersion};

/// 等待所属通配符回答的例外条目
#[derive(Debug, Clone)]
struct PendingException {
    exception: String,
    wildcard: String,
    context: String,
    /// 通配符已回答为存在，下一次即可查询该例外
    ready: bool,
}

#[derive(Debug, Clone)]
enum Mode {
    Searching,
    Converged(Convergence),
    Verifying {
        convergence: Convergence,
        queue: VecDeque<Query>,
        mismatches: Vec<String>,
    },
}

/// 单个识别会话的状态机（非线程安全，一个会话只由一个驱动方使用）
#[derive(Debug, Clone)]
pub struct IdentificationEngine {
    candidates: Vec<PreparedVersion>,
    answers: FxHashMap<String, bool>,
    /// 已回答或已跳过的条目，不再参与选择
    used: FxHashSet<String>,
    match_mode: MatchMode,
    pending: Option<PendingException>,
    outstanding: Option<Query>,
    mode: Mode,
}

impl IdentificationEngine {
    pub fn new(candidates: Vec<PreparedVersion>) -> Self {
        Self::with_match_mode(candidates, MatchMode::default())
    }

    pub fn with_match_mode(mut candidates: Vec<PreparedVersion>, match_mode: MatchMode) -> Self {
        candidates.sort_by_key(PreparedVersion::commit_timestamp);
        Self {
            candidates,
            answers: FxHashMap::default(),
            used: FxHashSet::default(),
            match_mode,
            pending: None,
            outstanding: None,
            mode: Mode::Searching,
        }
    }

    pub fn match_mode(&self) -> MatchMode {
        self.match_mode
    }

    /// 当前幸存候选（按时间升序）
    pub fn candidates(&self) -> &[PreparedVersion] {
        &self.candidates
    }

    pub fn remaining(&self) -> usize {
        self.candidates.len()
    }

    /// 已记录的回答
    pub fn answers(&self) -> &FxHashMap<String, bool> {
        &self.answers
    }

    pub fn is_converged(&self) -> bool {
        !matches!(self.mode, Mode::Searching)
    }

    /// 计算下一步：返回待回答的查询或收敛结果
    /// 未回答的查询会被原样重复返回
    pub fn next_query(&mut self) -> CoreResult<Step> {
        if let Some(query) = &self.outstanding {
            return Ok(Step::Query(query.clone()));
        }

        match &mut self.mode {
            Mode::Searching => {}
            Mode::Converged(convergence) => return Ok(Step::Converged(*convergence)),
            Mode::Verifying {
                convergence, queue, ..
            } => {
                return Ok(match queue.pop_front() {
                    Some(query) => {
                        self.outstanding = Some(query.clone());
                        Step::Query(query)
                    }
                    None => Step::Converged(*convergence),
                });
            }
        }

        loop {
            // 1. 收敛检查
            if let Some(convergence) = self.check_convergence()? {
                return Ok(Step::Converged(self.converge(convergence)));
            }

            // 2. 通配符已确认存在的例外优先查询
            if self.pending.as_ref().is_some_and(|p| p.ready) {
                if let Some(pending) = self.pending.take() {
                    return Ok(self.emit(Query::new(
                        pending.exception,
                        pending.context,
                        QueryPurpose::Search,
                    )));
                }
            }

            // 3. 选择新的区分性条目
            let Some(selection) = select_query(&self.candidates, &self.used) else {
                log::debug!(
                    "no distinguishing entry left | candidates: {}",
                    self.candidates.len()
                );
                let convergence = Convergence {
                    exact: false,
                    candidates: self.candidates.len(),
                };
                return Ok(Step::Converged(self.converge(convergence)));
            };
            let context = &self.candidates[selection.context];
            let context_hash = context.commit_hash().to_string();

            if RuleKind::of(&selection.rule) != RuleKind::Exception {
                return Ok(self.emit(Query::new(selection.rule, context_hash, QueryPurpose::Search)));
            }

            // 4. 例外条目：先确认所属通配符
            let wildcard = context
                .wildcard_for_exception(&selection.rule)
                .ok_or_else(|| CoreError::MissingWildcard {
                    exception: selection.rule.clone(),
                    commit_hash: context_hash.clone(),
                })?
                .to_string();

            match self.answers.get(&wildcard).copied() {
                Some(true) => {
                    return Ok(self.emit(Query::new(
                        selection.rule,
                        context_hash,
                        QueryPurpose::Search,
                    )));
                }
                Some(false) => self.skip_exception(&selection.rule, &wildcard),
                None => {
                    let query = Query::new(
                        wildcard.clone(),
                        context_hash.clone(),
                        QueryPurpose::GoverningWildcard {
                            exception: selection.rule.clone(),
                        },
                    );
                    self.pending = Some(PendingException {
                        exception: selection.rule,
                        wildcard,
                        context: context_hash,
                        ready: false,
                    });
                    return Ok(self.emit(query));
                }
            }
        }
    }

    /// 记录一次回答（总是成功）
    pub fn report_answer(&mut self, sample: &str, present: bool) {
        if self
            .outstanding
            .as_ref()
            .is_some_and(|query| query.rule == sample)
        {
            self.outstanding = None;
        }

        match &mut self.mode {
            Mode::Searching => {}
            Mode::Converged(_) => {
                log::warn!("answer ignored after convergence | sample: {}", sample);
                return;
            }
            Mode::Verifying { mismatches, .. } => {
                if !present {
                    log::debug!("verification mismatch | sample: {}", sample);
                    mismatches.push(sample.to_string());
                }
                return;
            }
        }

        self.apply_answer(sample, present);

        // 所属通配符的回答决定例外条目的去向
        if !self.pending.as_ref().is_some_and(|p| p.wildcard == sample) {
            return;
        }
        if present {
            if let Some(pending) = self.pending.as_mut() {
                pending.ready = true;
            }
        } else if let Some(pending) = self.pending.take() {
            self.skip_exception(&pending.exception, &pending.wildcard);
        }
    }

    /// 收敛后的结果版本
    pub fn result(&self) -> CoreResult<&[PreparedVersion]> {
        match self.mode {
            Mode::Searching => Err(CoreError::NotConverged),
            _ => Ok(&self.candidates),
        }
    }

    /// 进入校验阶段：逐条确认结果版本的全部条目
    pub fn begin_verification(&mut self) -> CoreResult<()> {
        let convergence = match &self.mode {
            Mode::Converged(convergence) => *convergence,
            Mode::Searching => {
                return Err(CoreError::InvalidStateTransition(
                    "verification requires a converged session".into(),
                ))
            }
            Mode::Verifying { .. } => {
                return Err(CoreError::InvalidStateTransition(
                    "verification already started".into(),
                ))
            }
        };
        let version = self.candidates.first().ok_or(CoreError::NoCandidates)?;
        let queue = verification_queue(version);
        log::debug!(
            "verification started | version: {}, queries: {}",
            version.commit_hash(),
            queue.len()
        );
        self.mode = Mode::Verifying {
            convergence,
            queue,
            mismatches: Vec::new(),
        };
        Ok(())
    }

    /// 校验阶段回答为不存在的条目
    pub fn verification_mismatches(&self) -> &[String] {
        match &self.mode {
            Mode::Verifying { mismatches, .. } => mismatches,
            _ => &[],
        }
    }

    /// 校验阶段剩余查询数（含未回答的当前查询）
    pub fn verification_remaining(&self) -> usize {
        match &self.mode {
            Mode::Verifying { queue, .. } => queue.len() + usize::from(self.outstanding.is_some()),
            _ => 0,
        }
    }

    fn emit(&mut self, query: Query) -> Step {
        self.outstanding = Some(query.clone());
        Step::Query(query)
    }

    fn converge(&mut self, convergence: Convergence) -> Convergence {
        log::debug!(
            "session converged | exact: {}, candidates: {}, answers: {}",
            convergence.exact,
            convergence.candidates,
            self.answers.len()
        );
        self.pending = None;
        self.mode = Mode::Converged(convergence);
        convergence
    }

    /// 通配符不存在时例外无法探测：只标记为已使用，不据此裁剪候选
    /// 其他候选中该例外可能归属另一个通配符
    fn skip_exception(&mut self, exception: &str, wildcard: &str) {
        log::debug!(
            "exception skipped | exception: {}, wildcard: {}",
            exception,
            wildcard
        );
        self.used.insert(exception.to_string());
    }

    fn apply_answer(&mut self, sample: &str, present: bool) {
        self.answers.insert(sample.to_string(), present);
        self.used.insert(sample.to_string());

        let before = self.candidates.len();
        let match_mode = self.match_mode;
        self.candidates
            .retain(|candidate| match_mode.survives(candidate, sample, present));
        recompute_relative_changes(&mut self.candidates, FirstVersion::Empty);

        log::debug!(
            "answer applied | sample: {}, present: {}, candidates: {} -> {}",
            sample,
            present,
            before,
            self.candidates.len()
        );
    }

    fn check_convergence(&self) -> CoreResult<Option<Convergence>> {
        let Some(first) = self.candidates.first() else {
            return Err(CoreError::NoCandidates);
        };
        let candidates = self.candidates.len();

        if candidates == 1 || self.all_within(first.commit_hash(), first.equal_versions()) {
            return Ok(Some(Convergence {
                exact: true,
                candidates,
            }));
        }
        if self.all_within(first.commit_hash(), first.equal_versions_without_tld()) {
            return Ok(Some(Convergence {
                exact: false,
                candidates,
            }));
        }
        Ok(None)
    }

    /// 幸存候选是否恰好是 first 及其等价版本
    fn all_within(&self, first_hash: &str, equal: &[String]) -> bool {
        let group: FxHashSet<&str> = std::iter::once(first_hash)
            .chain(equal.iter().map(String::as_str))
            .collect();
        group.len() == self.candidates.len()
            && self
                .candidates
                .iter()
                .all(|c| group.contains(c.commit_hash()))
    }
}
