//! Publications: reports and articles with authors and tags.

use crate::listing::{FilterField, Relation, Resource, ResourceError, SortDirection};

pub(super) fn resource() -> Result<Resource, ResourceError> {
    Resource::builder("publications", "publications")
        .columns(&[
            "id",
            "title",
            "slug",
            "abstract",
            "type",
            "status",
            "published",
            "publication_date",
            "category_id",
            "file_url",
            "cover_image",
            "created_at",
            "updated_at",
        ])
        .lookup("event_categories", "c", "category_id", &[("name", "category_name")])
        .booleans(&["published"])
        .searchable(&["title", "abstract"])
        .filter(FilterField::equals("status", "status").with_wildcard("all"))
        .filter(FilterField::boolean("published", "published"))
        .filter(FilterField::integer("category", "category_id"))
        .filter(FilterField::equals("type", "type"))
        .sort("publicationDate", "publication_date")
        .sort("title", "title")
        .sort("createdAt", "created_at")
        .sort("updatedAt", "updated_at")
        .default_sort("createdAt", SortDirection::Desc)
        .tie_breaker("id")
        .relation(
            Relation::through(
                "authors",
                "authors",
                "authors_on_publications",
                "publication_id",
                "author_id",
            )
            .columns(&["id", "name", "title", "organization"])
            .pivot_columns(&[("display_order", "display_order")])
            .order_by_pivot("display_order", SortDirection::Asc),
        )
        .relation(
            Relation::through("tags", "tags", "tags_on_publications", "publication_id", "tag_id")
                .columns(&["id", "name", "slug"])
                .order_by("name", SortDirection::Asc),
        )
        .build()
}
