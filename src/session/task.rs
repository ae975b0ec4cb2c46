use std::sync::{Arc, Mutex, PoisonError};

/// Result of an asynchronous device query, polled by the host once per frame.
///
/// Tasks cannot be cancelled. A completed task keeps its value.
#[derive(Debug)]
pub struct AsyncTask<T> {
    slot: Arc<Mutex<Option<T>>>,
}

/// Write side of a pending [`AsyncTask`].
#[derive(Debug)]
pub struct TaskCompleter<T> {
    slot: Arc<Mutex<Option<T>>>,
}

impl<T> Clone for AsyncTask<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T: Clone> AsyncTask<T> {
    pub fn ready(value: T) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(value))),
        }
    }

    pub fn pending() -> (Self, TaskCompleter<T>) {
        let slot = Arc::new(Mutex::new(None));
        (
            Self {
                slot: Arc::clone(&slot),
            },
            TaskCompleter { slot },
        )
    }

    pub fn is_complete(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn result(&self) -> Option<T> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<T> TaskCompleter<T> {
    /// Resolves the task.
    pub fn complete(self, value: T) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_task_is_complete() {
        let task = AsyncTask::ready(7u8);
        assert!(task.is_complete());
        assert_eq!(task.result(), Some(7));
    }

    #[test]
    fn pending_task_completes_once() {
        let (task, completer) = AsyncTask::<u8>::pending();
        assert!(!task.is_complete());
        assert_eq!(task.result(), None);

        completer.complete(3);
        assert_eq!(task.result(), Some(3));
        assert_eq!(task.clone().result(), Some(3));
    }
}
