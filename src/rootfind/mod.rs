//! rootfind — safeguarded bounded 1-D zero finding.
//!
//! Purpose
//! -------
//! Provide the numerical root-finding routine the component families use to
//! invert monotone scalar functions, most importantly solving
//! `digamma(a) = target` for the Gamma family's maximum-likelihood shape.
//!
//! Key behaviors
//! -------------
//! - [`find_zero`] alternates bisection (guaranteed progress) with a secant
//!   step (fast local convergence), bracketing on the sign of `f`, and
//!   probes outward when the starting guesses do not bracket a sign change.
//! - Failure is signaled by the non-finite sentinel `f64::NAN`, never by an
//!   out-of-bracket value; callers fall back to moment estimates.
//! - [`RootOptions`] carries the tolerance and iteration caps explicitly per
//!   call; there is no process-wide state.
//! - [`inverse_digamma`] wraps the digamma solve with a safe seeding policy.
//!
//! Conventions
//! -----------
//! - `f` is assumed monotone and continuous with a known positive domain
//!   lower bound; outward probing halves the lower endpoint (staying inside
//!   the domain) and doubles the upper endpoint.
//! - This module performs no I/O and no logging; a NaN return carries the
//!   whole failure story.

pub mod zero;

pub use self::zero::{find_zero, inverse_digamma, RootOptions};
