//! One mutation invocation and the callers attached to it.

// std
use std::{
	panic::{self, AssertUnwindSafe},
	sync::{
		OnceLock,
		atomic::{AtomicUsize, Ordering},
	},
	task::Poll,
};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, UserId},
};

pub(crate) type Invocation = Pin<Box<dyn Future<Output = Result<AccessToken>> + Send>>;

/// A single invocation shared by every caller routed to it.
///
/// The invocation future lives behind an async lock: whichever waiter holds the lock polls it,
/// the rest queue up and read the recorded outcome once they get the lock. A waiter dropped
/// mid-poll releases the lock and the next waiter resumes the same future, so the executor is
/// never called twice for one flight. A panicking invocation settles the flight with
/// [`Error::InvocationPanicked`] before the panic resumes in the polling waiter.
pub(crate) struct Flight {
	pub(crate) id: u64,
	pub(crate) user: UserId,
	invocation: AsyncMutex<Invocation>,
	outcome: OnceLock<Result<AccessToken>>,
	// Callers routed to this flight whose futures are still alive.
	attached: AtomicUsize,
}
impl Flight {
	pub(crate) fn new(id: u64, user: UserId, invocation: Invocation) -> Self {
		Self {
			id,
			user,
			invocation: AsyncMutex::new(invocation),
			outcome: OnceLock::new(),
			attached: AtomicUsize::new(0),
		}
	}

	pub(crate) fn attach(&self) {
		self.attached.fetch_add(1, Ordering::AcqRel);
	}

	/// Returns the number of callers still attached after this one leaves.
	pub(crate) fn detach(&self) -> usize {
		self.attached.fetch_sub(1, Ordering::AcqRel).saturating_sub(1)
	}

	pub(crate) fn is_settled(&self) -> bool {
		self.outcome.get().is_some()
	}

	pub(crate) async fn wait(self: Arc<Self>) -> Result<AccessToken> {
		if let Some(outcome) = self.outcome.get() {
			return outcome.clone();
		}

		let mut invocation = self.invocation.lock().await;

		// Settled while this waiter was queued on the lock.
		if let Some(outcome) = self.outcome.get() {
			return outcome.clone();
		}

		let polled = std::future::poll_fn(|cx| {
			let poll =
				panic::catch_unwind(AssertUnwindSafe(|| Pin::as_mut(&mut *invocation).poll(cx)));

			match poll {
				Ok(Poll::Ready(outcome)) => Poll::Ready(Ok(outcome)),
				Ok(Poll::Pending) => Poll::Pending,
				Err(payload) => Poll::Ready(Err(payload)),
			}
		})
		.await;

		// Only the lock holder writes, so the cell is still empty here.
		match polled {
			Ok(outcome) => {
				let _ = self.outcome.set(outcome.clone());

				outcome
			},
			Err(payload) => {
				let _ = self.outcome.set(Err(Error::InvocationPanicked));

				panic::resume_unwind(payload)
			},
		}
	}
}
impl Debug for Flight {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Flight")
			.field("id", &self.id)
			.field("user", &self.user)
			.field("settled", &self.is_settled())
			.field("attached", &self.attached.load(Ordering::Acquire))
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::time::Duration;
	// crates.io
	use tokio::sync::oneshot;
	// self
	use super::*;

	fn gated_flight(polls: Arc<AtomicUsize>, gate: oneshot::Receiver<()>) -> Arc<Flight> {
		let user = UserId::new("VXNlcjox").expect("User fixture should be valid.");

		Arc::new(Flight::new(
			1,
			user,
			Box::pin(async move {
				polls.fetch_add(1, Ordering::SeqCst);

				let _ = gate.await;

				Ok::<_, Error>(AccessToken::new("1", "tok_abc"))
			}),
		))
	}

	#[tokio::test]
	async fn waiters_share_one_outcome() {
		let polls = Arc::new(AtomicUsize::new(0));
		let (release, gate) = oneshot::channel();
		let flight = gated_flight(polls.clone(), gate);
		let first = tokio::spawn(flight.clone().wait());
		let second = tokio::spawn(flight.clone().wait());

		tokio::task::yield_now().await;
		release.send(()).expect("Gate should still be open.");

		let first = first.await.expect("First waiter should not panic.");
		let second = second.await.expect("Second waiter should not panic.");
		let first = first.expect("First waiter should receive the token.");
		let second = second.expect("Second waiter should receive the token.");

		assert!(first.ptr_eq(&second));
		assert!(flight.is_settled());
		assert_eq!(polls.load(Ordering::SeqCst), 1);

		let late = flight.wait().await.expect("Late waiter should read the recorded outcome.");

		assert!(late.ptr_eq(&first));
	}

	#[tokio::test]
	async fn dropped_waiter_hands_over_the_same_invocation() {
		let polls = Arc::new(AtomicUsize::new(0));
		let (release, gate) = oneshot::channel();
		let flight = gated_flight(polls.clone(), gate);
		let abandoned = tokio::time::timeout(Duration::from_millis(20), flight.clone().wait()).await;

		assert!(abandoned.is_err(), "The gated invocation should still be pending.");
		assert_eq!(polls.load(Ordering::SeqCst), 1);

		release.send(()).expect("Gate should still be open.");

		let token = flight.wait().await.expect("Next waiter should finish the invocation.");

		assert_eq!(token.expose(), "tok_abc");
		assert_eq!(polls.load(Ordering::SeqCst), 1);
	}

	fn exploding_invocation() -> Result<AccessToken> {
		panic!("Invocation failure.")
	}

	#[tokio::test]
	async fn panicking_invocation_settles_for_queued_waiters() {
		let user = UserId::new("VXNlcjox").expect("User fixture should be valid.");
		let flight = Arc::new(Flight::new(
			1,
			user,
			Box::pin(async {
				tokio::task::yield_now().await;

				exploding_invocation()
			}),
		));
		let driver = tokio::spawn(flight.clone().wait());

		assert!(driver.await.expect_err("The driving waiter should panic.").is_panic());
		assert!(flight.is_settled());
		assert!(matches!(flight.wait().await, Err(Error::InvocationPanicked)));
	}

	#[test]
	fn detach_reports_remaining_callers() {
		let user = UserId::new("VXNlcjox").expect("User fixture should be valid.");
		let flight =
			Flight::new(1, user, Box::pin(async { Ok::<_, Error>(AccessToken::new("1", "tok")) }));

		flight.attach();
		flight.attach();

		assert_eq!(flight.detach(), 1);
		assert_eq!(flight.detach(), 0);
	}
}
