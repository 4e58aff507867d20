pub mod delegate;

pub use delegate::{DelegateReference, DelegateResolver, SmuggledUrl, TargetLocator};
