use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::thread;

use futures::channel::oneshot;

use crate::nat::Nat;

/// Pending result of one backend's gateway discovery.
///
/// Resolves at most once, to a ready-to-use [`Nat`]. A backend that finds
/// nothing never resolves: there is no error value, so callers race the
/// handle against a deadline (and against the other backend) and treat
/// "nothing in time" as "protocol unavailable".
#[must_use = "a Discovery does nothing unless polled or taken"]
pub struct Discovery {
    receiver: Option<oneshot::Receiver<Box<dyn Nat>>>,
}

impl Discovery {
    /// Run `task` on a named thread and publish its result, if any.
    pub(crate) fn spawn<F>(name: &str, task: F) -> Discovery
    where
        F: FnOnce() -> Option<Box<dyn Nat>> + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let spawned = thread::Builder::new().name(name.to_string()).spawn(move || {
            if let Some(nat) = task() {
                // Receiver dropped, nobody is listening anymore.
                if sender.send(nat).is_err() {
                    debug!("discovery result dropped, receiver is gone");
                }
            }
        });
        if let Err(err) = spawned {
            warn!("could not start {} thread: {}", name, err);
        }
        Discovery {
            receiver: Some(receiver),
        }
    }

    /// Take the discovered gateway if it has already been published.
    ///
    /// Never blocks. Returns `None` while discovery is running, after it
    /// failed, and after the value has been taken once.
    pub fn try_take(&mut self) -> Option<Box<dyn Nat>> {
        let result = match self.receiver {
            Some(ref mut receiver) => receiver.try_recv(),
            None => return None,
        };
        match result {
            Ok(Some(nat)) => {
                self.receiver = None;
                Some(nat)
            }
            Ok(None) => None,
            Err(oneshot::Canceled) => {
                self.receiver = None;
                None
            }
        }
    }
}

impl Future for Discovery {
    type Output = Box<dyn Nat>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context) -> Poll<Box<dyn Nat>> {
        let poll = match self.receiver {
            Some(ref mut receiver) => Pin::new(receiver).poll(cx),
            None => return Poll::Pending,
        };
        match poll {
            Poll::Ready(Ok(nat)) => {
                self.receiver = None;
                Poll::Ready(nat)
            }
            // The backend gave up. Stay pending, absence is the only signal.
            Poll::Ready(Err(oneshot::Canceled)) => {
                self.receiver = None;
                Poll::Pending
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl fmt::Debug for Discovery {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Discovery")
            .field("open", &self.receiver.is_some())
            .finish()
    }
}
