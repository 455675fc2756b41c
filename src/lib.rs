//! # Photo Squeeze
//!
//! Re-encodes photos so each one fits a byte budget. Users pick a target size
//! in kilobytes, an optional maximum width and an output codec; every input
//! is decoded, resized, and searched for the highest quality that fits.
//!
//! # Architecture: Per-File Search, Parallel Batch
//!
//! ```text
//! input bytes → decode → resize to max width → quality bisection
//!                                                   │ nothing fits
//!                                                   ▼
//!                              width × 0.85 (floor 720px) → quality bisection
//! ```
//!
//! Each file is independent: a batch runs files in parallel and a failing
//! file never affects its neighbours. The search itself lives behind the
//! [`imaging::ImageBackend`] trait so its rules can be tested against a
//! deterministic mock without encoding real pixels.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Dimension math, codecs, the backend trait and the size search |
//! | [`batch`] | Multi-file runs: input limits, per-file errors, progress events |
//! | [`naming`] | `<stem>-compressed.<ext>` output names |
//! | [`config`] | `photo-squeeze.toml` loading, defaults and validation |
//! | [`output`] | CLI output formatting for progress and summaries |
//!
//! # Design Decisions
//!
//! ## Best Effort Over Failure
//!
//! A target that cannot be met is not an error. When no quality at the
//! minimum width fits, the smallest encode produced is returned with a
//! [`imaging::TargetNote`] explaining why. Errors are reserved for inputs that
//! cannot be read, decoded or encoded at all.
//!
//! ## Lossless Output Is Exempt
//!
//! PNG has no quality axis, so a PNG request is a single encode at the
//! resized dimensions. The result always carries a note suggesting a lossy
//! codec.
//!
//! ## Pure-Rust Decoding, libwebp for Lossy WebP
//!
//! Decoding, resizing, JPEG and PNG run on the `image` crate. The `image`
//! crate's WebP encoder is lossless-only, so lossy WebP goes through the
//! `webp` crate's libwebp bindings.

pub mod batch;
pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;

#[cfg(test)]
pub(crate) mod test_helpers;
