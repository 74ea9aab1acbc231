use std::collections::HashMap;

use schema::document::{Document, FieldKind};
use tantivy::schema::{
    Field, IndexRecordOption, Schema, SchemaBuilder, TextFieldIndexing, TextOptions, FAST,
    STORED, STRING,
};
use tantivy::Document as TantivyDocument;

/// Name registered with `tantivy::tokenizer::TokenizerManager` for the
/// `content_tokens` field. Documents reach us already segmented by the
/// `tokenizer` crate and space-joined, so indexing only needs to split on
/// whitespace; there is no further morphological work for tantivy to do.
pub const CONTENT_TOKENS_TOKENIZER: &str = "ja_tokens";

/// Every field in the enterprise schema, tagged with the
/// [`FieldKind`] that fixes its storage/indexing/filtering behavior.
/// `build()` is driven entirely off this table; adding a field means
/// adding a row here, not a one-off `SchemaBuilder` call.
const FIELD_TABLE: &[(&str, FieldKind)] = &[
    ("id", FieldKind::Id),
    ("url", FieldKind::StoredText),
    ("url_name", FieldKind::StoredText),
    ("content_tokens", FieldKind::AnalyzedText),
    ("jcn", FieldKind::SortableKeyword),
    ("cust_status2", FieldKind::Keyword),
    ("company_name_kj", FieldKind::StoredText),
    ("company_address_all", FieldKind::StoredText),
    ("prefecture", FieldKind::Keyword),
    ("city", FieldKind::Keyword),
    ("large_class_name", FieldKind::Keyword),
    ("middle_class_name", FieldKind::Keyword),
    ("curr_setlmnt_taking_amt", FieldKind::Numeric),
    ("employee_all_num", FieldKind::Numeric),
    ("district_finalized_cd", FieldKind::StoredText),
    ("branch_name_cd", FieldKind::StoredText),
    ("main_domain_url", FieldKind::StoredText),
];

/// Handles for every field in the enterprise schema, resolved once at
/// [`crate::Engine::open`] and reused for every write/search call.
#[derive(Clone)]
pub struct Fields {
    pub id: Field,
    pub url: Field,
    pub url_name: Field,
    pub content_tokens: Field,
    pub jcn: Field,
    pub cust_status2: Field,
    pub company_name_kj: Field,
    pub company_address_all: Field,
    pub prefecture: Field,
    pub city: Field,
    pub large_class_name: Field,
    pub middle_class_name: Field,
    pub curr_setlmnt_taking_amt: Field,
    pub employee_all_num: Field,
    pub district_finalized_cd: Field,
    pub branch_name_cd: Field,
    pub main_domain_url: Field,
}

/// Builds the tantivy `Schema` by walking [`FIELD_TABLE`] and resolving each
/// row's [`FieldKind`] to its `tantivy::schema` options, returning the field
/// handles alongside it.
pub fn build() -> (Schema, Fields) {
    let mut builder = SchemaBuilder::new();

    let content_indexing = TextFieldIndexing::default()
        .set_tokenizer(CONTENT_TOKENS_TOKENIZER)
        .set_index_option(IndexRecordOption::WithFreqsAndPositions);
    let content_options = TextOptions::default().set_indexing_options(content_indexing);

    let mut handles: HashMap<&str, Field> = HashMap::with_capacity(FIELD_TABLE.len());
    for &(name, kind) in FIELD_TABLE {
        let field = match kind {
            FieldKind::Id => builder.add_text_field(name, STRING | STORED),
            FieldKind::StoredText => builder.add_text_field(name, STORED),
            FieldKind::AnalyzedText => builder.add_text_field(name, content_options.clone()),
            FieldKind::Keyword => builder.add_text_field(name, STRING | STORED),
            FieldKind::SortableKeyword => builder.add_text_field(name, STRING | STORED | FAST),
            FieldKind::Numeric => builder.add_u64_field(name, STORED),
        };
        handles.insert(name, field);
    }

    let schema = builder.build();
    let fields = Fields {
        id: handles["id"],
        url: handles["url"],
        url_name: handles["url_name"],
        content_tokens: handles["content_tokens"],
        jcn: handles["jcn"],
        cust_status2: handles["cust_status2"],
        company_name_kj: handles["company_name_kj"],
        company_address_all: handles["company_address_all"],
        prefecture: handles["prefecture"],
        city: handles["city"],
        large_class_name: handles["large_class_name"],
        middle_class_name: handles["middle_class_name"],
        curr_setlmnt_taking_amt: handles["curr_setlmnt_taking_amt"],
        employee_all_num: handles["employee_all_num"],
        district_finalized_cd: handles["district_finalized_cd"],
        branch_name_cd: handles["branch_name_cd"],
        main_domain_url: handles["main_domain_url"],
    };

    (schema, fields)
}

/// Converts a `schema::Document` into the tantivy document written by
/// `Engine::add`/`add_batch`. `document` is assumed already normalized
/// (see `schema::Document::normalize`).
pub fn to_tantivy(fields: &Fields, document: &Document) -> TantivyDocument {
    let mut doc = TantivyDocument::new();
    doc.add_text(fields.id, &document.id);
    doc.add_text(fields.url, &document.url);
    doc.add_text(fields.url_name, &document.url_name);
    doc.add_text(fields.content_tokens, &document.content_tokens);
    doc.add_text(fields.jcn, &document.jcn);
    doc.add_text(fields.cust_status2, &document.cust_status2);
    doc.add_text(fields.company_name_kj, &document.company_name_kj);
    doc.add_text(fields.company_address_all, &document.company_address_all);
    doc.add_text(fields.prefecture, &document.prefecture);
    doc.add_text(fields.city, &document.city);
    doc.add_text(fields.large_class_name, &document.large_class_name);
    doc.add_text(fields.middle_class_name, &document.middle_class_name);
    doc.add_u64(fields.curr_setlmnt_taking_amt, document.curr_setlmnt_taking_amt);
    doc.add_u64(fields.employee_all_num, document.employee_all_num);
    doc.add_text(fields.district_finalized_cd, &document.district_finalized_cd);
    doc.add_text(fields.branch_name_cd, &document.branch_name_cd);
    doc.add_text(fields.main_domain_url, &document.main_domain_url);
    doc
}
