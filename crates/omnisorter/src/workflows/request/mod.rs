//! OmniSorter quotation and drawing requests: the field catalog, derived
//! quantities, document composition, and the service that stores requests.

pub mod composer;
pub mod derivation;
pub mod domain;
pub mod mapping;
pub mod router;
pub mod schema;
pub mod service;
pub mod session;
pub mod values;

#[cfg(test)]
mod tests;

pub use composer::{
    compose_document, compose_drawing, compose_quotation, drawing_document, quotation_document,
    DocumentEntry, DocumentSection, RequestDocument, TranslationTable, DRAWING_FOOTER,
    DRAWING_HEADER, QUOTATION_FOOTER, QUOTATION_HEADER,
};
pub use derivation::{
    cart_options, choice_from_label, compute_grid_count, compute_surface_count, grid_count_of,
    is_field_visible, surface_count_of, quantity_options, tote_options, DerivedQuantities, QuantityOption,
    CUSTOM_ENTRY_LABEL,
};
pub use domain::{
    Applicability, DocumentKind, FieldDefinition, FieldDomain, FieldGroup, FieldKey, FieldValue,
    Multiplier, QuantityChoice, QuantityUnit, SubItem, VisibilityRule,
};
pub use mapping::PropertyMapping;
pub use router::request_router;
pub use schema::{all_fields, fields_for, FieldSchema, FieldView};
pub use service::{
    ConnectionReport, ConnectionStatus, CustomerLink, DatabaseCheck, DatabaseIds, MasterEntry,
    RequestPreview, RequestService, RequestServiceError, RequestSubmission, StoredRequest,
};
pub use session::{HiddenFieldPolicy, RequestSession, UnknownPolicy};
pub use values::FieldValueMap;
