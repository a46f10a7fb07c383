pub use mt_fields_spec_tables::{
    Capability, ComponentKind, ComponentSpec, DateFormat, FieldSpec, FieldTables, OverflowPolicy,
    SpecError, Strategy, TablesError, TimeFormat, ValueLayout, json_key,
};
