//! Content resolution for ICI TOU.TV.
//!
//! The crate turns a `https://ici.tou.tv/<show>[/SxxExx]` page into a
//! [`media::DelegateReference`] pointing at the Radio-Canada media resolver.
//! When account credentials are supplied, the OAuth web login is replayed
//! first and the resulting bearer token and claims travel alongside the
//! reference as a sidecar, never inside its printable form.

pub mod extractor;
pub mod media;
pub mod session;
