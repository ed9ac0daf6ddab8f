//! Property-based tests: parsing is total, compiled SQL never carries values.

mod filter_props;
mod parser_props;
