// SPDX-License-Identifier: MPL-2.0

mod codec;
pub mod preset;
pub mod select;

pub use codec::Codec;
pub use select::{Candidate, Diagnostic, Protocol, ScoredStream, Selection, TrackStreams};
