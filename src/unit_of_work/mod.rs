//! Unit of Work - One atomic storage transaction per attempt.
//!
//! `UnitOfWork::atomic` opens a transaction, adapts it into the caller's
//! `AtomicContext`, runs the business logic, and then either rolls back or
//! commits and publishes the events the logic recorded.
//!
//! ```text
//! begin ─▶ new_context ─▶ body ─┬─ Err / panic ─▶ rollback ─▶ close ─▶ Err(Logic) / resume panic
//!                               └─ Ok ─▶ commit ─┬─ Err ─▶ rollback ─▶ close ─▶ Err(Commit)
//!                                                └─ Ok ─▶ collect_events ─▶ close ─▶ publish
//! ```
//!
//! ## Example
//!
//! ```ignore
//! let uow = UnitOfWork::new(storage, AccountsContext::new, bus);
//!
//! uow.atomic(&Cancellation::new(), |_cancel, ctx| {
//!     ctx.accounts().deposit("acc-1", 100)?;
//!     Ok::<_, AccountsError>(())
//! })?;
//! ```

mod error;
mod unit_of_work;

pub use error::{Phase, UnitOfWorkError};
pub use unit_of_work::UnitOfWork;
