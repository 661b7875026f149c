//! Shared result budget for one traversal request

use std::sync::{Mutex, MutexGuard};

#[derive(Debug)]
struct QuotaState {
    global_count: usize,
    used: Vec<usize>,
}

/// Caps the relation paths materialised across all type-paths of a request.
///
/// The budget is split up front: every type-path gets `total / n`, and the
/// remainder goes one unit each to the lowest-indexed paths. A path never
/// consumes another path's allowance, so which results survive does not
/// depend on task scheduling.
#[derive(Debug)]
pub struct PathQuotaManager {
    total_limit: usize,
    request_path_type_num: usize,
    allowances: Vec<usize>,
    state: Mutex<QuotaState>,
}

impl PathQuotaManager {
    pub fn new(total_limit: usize, request_path_type_num: usize) -> Self {
        let n = request_path_type_num.max(1);
        let base = total_limit / n;
        let remainder = total_limit % n;
        let allowances = (0..n)
            .map(|i| base + usize::from(i < remainder))
            .collect();

        Self {
            total_limit,
            request_path_type_num,
            allowances,
            state: Mutex::new(QuotaState {
                global_count: 0,
                used: vec![0; n],
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QuotaState> {
        // Counters stay consistent even if a holder panicked
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn total_limit(&self) -> usize {
        self.total_limit
    }

    pub fn request_path_type_num(&self) -> usize {
        self.request_path_type_num
    }

    pub fn allowance(&self, path_index: usize) -> usize {
        self.allowances.get(path_index).copied().unwrap_or(0)
    }

    pub fn global_count(&self) -> usize {
        self.lock().global_count
    }

    pub fn is_exhausted(&self) -> bool {
        self.lock().global_count >= self.total_limit
    }

    /// Whether the path has used its whole allowance
    pub fn path_satisfied(&self, path_index: usize) -> bool {
        let state = self.lock();
        state.used.get(path_index).copied().unwrap_or(0) >= self.allowance(path_index)
    }

    /// Take one unit of budget for `path_index`; false once spent
    pub fn try_acquire(&self, path_index: usize) -> bool {
        let allowance = self.allowance(path_index);
        let mut guard = self.lock();
        let state = &mut *guard;
        if state.global_count >= self.total_limit {
            return false;
        }
        match state.used.get_mut(path_index) {
            Some(used) if *used < allowance => {
                *used += 1;
                state.global_count += 1;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_allowances_split_in_enumeration_order() {
        let quota = PathQuotaManager::new(10, 3);
        assert_eq!(quota.allowance(0), 4);
        assert_eq!(quota.allowance(1), 3);
        assert_eq!(quota.allowance(2), 3);
        assert_eq!(quota.allowance(3), 0);
    }

    #[test]
    fn test_zero_quota_is_exhausted() {
        let quota = PathQuotaManager::new(0, 2);
        assert!(quota.is_exhausted());
        assert!(!quota.try_acquire(0));
        assert_eq!(quota.global_count(), 0);
    }

    #[test]
    fn test_acquire_until_satisfied() {
        let quota = PathQuotaManager::new(3, 2);
        assert!(quota.try_acquire(1));
        assert!(quota.path_satisfied(1));
        assert!(!quota.try_acquire(1));

        assert!(quota.try_acquire(0));
        assert!(quota.try_acquire(0));
        assert!(!quota.try_acquire(0));
        assert!(quota.is_exhausted());
        assert_eq!(quota.global_count(), 3);
    }

    #[test]
    fn test_concurrent_acquire_never_overshoots() {
        let quota = Arc::new(PathQuotaManager::new(100, 4));
        let handles: Vec<_> = (0..4)
            .map(|path| {
                let quota = quota.clone();
                std::thread::spawn(move || (0..1000).filter(|_| quota.try_acquire(path)).count())
            })
            .collect();

        let granted: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(granted, vec![25, 25, 25, 25]);
        assert_eq!(quota.global_count(), 100);
    }
}
