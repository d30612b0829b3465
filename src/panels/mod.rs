//! One module per wizard step; each extends `CystoViewApp` with a
//! `show_*_step` method rendered into the central panel.

pub mod download_ui;
pub mod peaks_ui;
pub mod range_ui;
pub mod refine_ui;
pub mod segments_ui;
pub mod upload_ui;
