//! Pipeline stages for spreadsheet-to-card generation.
//!
//! Each submodule implements exactly one step, so every step can be tested
//! without the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ table ──▶ normalize ──▶ render ──▶ artifact ──▶ document
//! (URL/path) (xlsx)   (4 fields)    (canvas)   (PNG)        (PDF page)
//!                                     ▲
//!                              assets │ font + logos, loaded once
//! ```
//!
//! 1. [`input`]    : resolve the user-supplied path or URL to a local `.xlsx`
//! 2. [`table`]    : read the first sheet into header-keyed rows and check
//!    the required columns
//! 3. [`normalize`]: pull `Name`, `Course`, `Year`, `Team` out of one row
//! 4. [`assets`]   : load the font and logos, substituting fallbacks
//! 5. [`render`]   : draw one card; [`qr`] builds its QR block and
//!    [`font`]/[`glyphs`] draw its text
//! 6. [`artifact`] : save the card as a PNG under a sanitised, unique name
//! 7. [`document`] : append the card as a PDF page and finalise the file

pub mod artifact;
pub mod assets;
pub mod document;
pub mod font;
pub mod glyphs;
pub mod input;
pub mod normalize;
pub mod qr;
pub mod render;
pub mod table;
