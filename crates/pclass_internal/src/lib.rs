//! Facade over the pclass crates.
pub use pclass_core as core;
pub use pclass_io as io;
pub use pclass_mega as mega;
pub use pclass_trie as trie;

#[allow(missing_docs)]
pub mod prelude {
    #[doc(hidden)]
    pub use pclass_core::prelude::*;
    #[doc(hidden)]
    pub use pclass_io::prelude::*;
    #[doc(hidden)]
    pub use pclass_mega::prelude::*;
    #[doc(hidden)]
    pub use pclass_trie::prelude::*;
}
