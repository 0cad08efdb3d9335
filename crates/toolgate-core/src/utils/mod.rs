pub mod encoding;

pub use encoding::{decode_base64, encode_base64, looks_like_png_base64};
