// Copyright 2024 The pcachefs Authors.
// See the "LICENSE.txt" file at the top-level directory of this distribution.
//
// Licensed under the MIT license. This file may not be copied, modified,
// or distributed except according to those terms.

#![doc = include_str!("../README.md")]
#![doc(html_root_url = "https://docs.rs/pcachefs/0.1.0")]
#![warn(
    unsafe_op_in_unsafe_fn,
    missing_docs,
    keyword_idents,
    macro_use_extern_crate,
    missing_debug_implementations,
    non_ascii_idents,
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_extern_crates,
    unused_import_braces,
    unused_labels,
    variant_size_differences,
    unused_qualifications,
    clippy::must_use_candidate
)]

pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod meta;
pub mod origin;
pub mod range;
pub mod store;
pub mod synthetic;

pub use crate::errors::{Error, Result};
