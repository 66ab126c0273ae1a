//! The library code for the `quire` static site compiler. A build can be
//! broken down into two distinct steps:
//!
//! 1. Discovering and validating posts from source files on disk
//!    ([`crate::parser`], [`crate::post`], [`crate::frontmatter`])
//! 2. Converting the posts into output files on disk ([`crate::write`],
//!    [`crate::feed`])
//!
//! The first step completes for every post before the second begins, so a
//! malformed post never leaves a half-written site behind.
//!
//! The second step is itself composed of three sub-steps:
//!
//! 1. Structuring each post body into an intro and chapters with nested
//!    subsections ([`crate::markdown`])
//! 2. Rendering the blocks and assembling the page around them
//!    ([`crate::inline`], [`crate::htmlrenderer`], [`crate::toc`],
//!    [`crate::page`])
//! 3. Writing the pages, the JSON post index, and the RSS feed atomically
//!
//! [`crate::build`] ties the steps together and [`crate::serve`] wraps them
//! in a development server that rebuilds on change.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod feed;
pub mod frontmatter;
pub mod htmlrenderer;
pub mod inline;
pub mod logging;
pub mod markdown;
pub mod page;
pub mod parser;
pub mod post;
pub mod serve;
pub mod toc;
mod util;
pub mod write;
