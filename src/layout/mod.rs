//! Row layout over a document's paragraphs.
//!
//! [`FlowLayout`] breaks every paragraph into rows no wider than a wrap
//! width, measuring graphemes with a [`TextMetrics`] and choosing break
//! points with a [`LineBreaker`]. Once laid out it maps offsets to caret
//! rectangles and points back to offsets.
//!
//! ```
//! use docmodel::Document;
//! use docmodel::content::Bias;
//! use docmodel::layout::FlowLayout;
//!
//! let doc = Document::new();
//! doc.insert_string(0, "hello big world", None).unwrap();
//! let mut layout = FlowLayout::new().wrap_width(10);
//! layout.layout(&doc);
//! assert_eq!(layout.rows().len(), 2);
//! let caret = layout.model_to_view(12, Bias::Forward).unwrap();
//! assert_eq!((caret.x, caret.y), (2, 1));
//! ```

mod breaker;
mod flow;
mod metrics;

pub use breaker::{CharBreaker, LineBreaker, WordBreaker};
pub use flow::{FlowLayout, Rect, Row};
pub use metrics::{
    CellMetrics, ScaledCellMetrics, TextMetrics, WidthMethod, display_width_char_with_method,
    display_width_with_method,
};
