//! Events: public calendar entries with speakers and tags.

use crate::listing::{FilterField, Relation, Resource, ResourceError, SortDirection};

pub(super) fn resource() -> Result<Resource, ResourceError> {
    Resource::builder("events", "events")
        .columns(&[
            "id",
            "title",
            "slug",
            "description",
            "start_date",
            "end_date",
            "location",
            "status",
            "published",
            "category_id",
            "image_url",
            "created_at",
            "updated_at",
        ])
        .lookup(
            "event_categories",
            "c",
            "category_id",
            &[("name", "category_name"), ("slug", "category_slug")],
        )
        .booleans(&["published"])
        .searchable(&["title", "description", "location"])
        .filter(FilterField::equals("status", "status"))
        .filter(FilterField::integer("category", "category_id"))
        .filter(FilterField::boolean("published", "published"))
        .filter(FilterField::on_or_after("from", "start_date"))
        .filter(FilterField::on_or_before("to", "start_date"))
        .sort("startDate", "start_date")
        .sort("endDate", "end_date")
        .sort("title", "title")
        .sort("createdAt", "created_at")
        .default_sort("startDate", SortDirection::Desc)
        .tie_breaker("id")
        .relation(
            Relation::through("speakers", "speakers", "event_speakers", "event_id", "speaker_id")
                .columns(&["id", "name", "title", "organization", "image_url"])
                .pivot_columns(&[("role", "role"), ("display_order", "display_order")])
                .order_by_pivot("display_order", SortDirection::Asc),
        )
        .relation(
            Relation::through("tags", "tags", "tags_on_events", "event_id", "tag_id")
                .columns(&["id", "name", "slug"])
                .order_by("name", SortDirection::Asc),
        )
        .build()
}
