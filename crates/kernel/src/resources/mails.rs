//! Mails: incoming and outgoing correspondence log.

use crate::listing::{FilterField, Resource, ResourceError, SortDirection};

pub(super) fn resource() -> Result<Resource, ResourceError> {
    Resource::builder("mails", "mails")
        .envelope("items")
        .columns(&[
            "id",
            "mail_number",
            "subject",
            "sender",
            "recipient",
            "date",
            "type",
            "status",
            "category_id",
            "description",
            "file_url",
            "created_at",
            "updated_at",
        ])
        .lookup(
            "mail_categories",
            "mc",
            "category_id",
            &[("name", "category_name"), ("code", "category_code")],
        )
        .searchable(&["subject", "mail_number", "sender", "recipient"])
        .filter(FilterField::equals("type", "type"))
        .filter(FilterField::equals("status", "status"))
        .filter(FilterField::integer("category", "category_id"))
        .sort("date", "date")
        .sort("subject", "subject")
        .sort("mailNumber", "mail_number")
        .sort("createdAt", "created_at")
        .default_sort("date", SortDirection::Desc)
        .tie_breaker("id")
        .build()
}
