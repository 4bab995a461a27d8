//! Point-and-click blemish removal via smoothest-patch search and seamless cloning.
//!
//! A click selects a square patch of the image. The 8 same-sized patches one
//! patch-step away in each compass direction are scored for smoothness
//! (variance of Laplacian edge energy), and the smoothest one is cloned over
//! the click through a soft circular mask with a gradient-domain blend, so the
//! seam is imperceptible. Clicks near the image edge work unchanged: the image
//! is reflect-padded before the search and cropped back afterwards.
//!
//! # Quick Start
//!
//! ```no_run
//! use blemish_removal::{HealConfig, HealSession};
//!
//! let img = image::open("portrait.png").unwrap().to_rgb8();
//! let mut session = HealSession::new(img, HealConfig::default()).unwrap();
//! session.heal(120, 85).unwrap();  // click coordinates
//! session.reset();                 // back to the original at any time
//! ```

#![deny(missing_docs)]

pub mod blending;
pub mod candidates;
pub mod error;
pub mod scoring;
mod session;

pub use error::{Error, Result};
pub use session::{
    default_output_path, is_supported_image, save_image, HealConfig, HealSession,
};
