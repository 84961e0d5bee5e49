pub mod enums;
pub mod fields;
pub mod header;
pub mod messages;
pub mod unit;

/* Re-export main public functions */
pub use enums::emit_enum_codec;
pub use fields::{emit_decode_clause, emit_encode_expr};
pub use header::emit_record_header;
pub use messages::emit_message_codec;
pub use unit::emit_unit;

/* First line of every generated file */
pub(crate) fn banner(unit_name: &str) -> String {
    format!("%% Generated by erlpb-gen from {}. Do not edit.\n", unit_name)
}
