//! Object service: fetches instances of one object type from whichever
//! backend stores it

use std::sync::Arc;

use async_trait::async_trait;
use ontoquery_condition::{render, ConditionCompiler, PropertyResolver};
use ontoquery_core::{
    Error, ObjectData, ObjectPage, ObjectQuery, ObjectSource, ObjectType, Result, ViewData,
    ViewQuery,
};
use serde_json::json;

use crate::traits::{SearchIndex, ViewFilter, ViewStore};

/// [`ObjectSource`] over a search index and a view store. Index-backed
/// object types are queried with the search DSL, view-backed ones with both
/// rendered forms.
pub struct ObjectService<I, V> {
    index: Arc<I>,
    views: Arc<V>,
    compiler: ConditionCompiler,
}

impl<I, V> ObjectService<I, V>
where
    I: SearchIndex,
    V: ViewStore,
{
    pub fn new(index: Arc<I>, views: Arc<V>, compiler: ConditionCompiler) -> Self {
        Self {
            index,
            views,
            compiler,
        }
    }

    pub fn compiler(&self) -> &ConditionCompiler {
        &self.compiler
    }

    async fn from_index(&self, index: &str, query: &ObjectQuery) -> Result<ObjectPage> {
        let resolver = PropertyResolver::for_schema(&query.object_type);
        let dsl = match &query.condition {
            Some(cfg) => self.compiler.compile(cfg, &resolver)?.convert().await?,
            None => json!({"match_all": {}}),
        };

        let hits = self
            .index
            .search(index, &dsl, query.limit)
            .await
            .map_err(Error::from)?;
        // A short page already holds every match
        let total_count = if query.with_total && hits.len() >= query.limit {
            self.index.count(index, &dsl).await.map_err(Error::from)?
        } else {
            hits.len() as u64
        };

        Ok(ObjectPage {
            objects: hits
                .into_iter()
                .map(|h| to_property_names(&query.object_type, h.source))
                .collect(),
            total_count,
        })
    }

    async fn from_view(&self, view_id: &str, query: &ObjectQuery) -> Result<ObjectPage> {
        let resolver = PropertyResolver::for_schema(&query.object_type);
        let rendered = render(&self.compiler, query.condition.as_ref(), &resolver).await?;
        let filter = ViewFilter {
            dsl: rendered.dsl,
            sql: rendered.sql,
        };

        let data = self
            .views
            .get_view_data_by_id(view_id, &filter, query.limit)
            .await
            .map_err(Error::from)?;

        let objects: Vec<ObjectData> = data
            .rows
            .into_iter()
            .map(|row| to_property_names(&query.object_type, row))
            .collect();
        Ok(ObjectPage {
            total_count: objects.len() as u64,
            objects,
        })
    }
}

/// Rename physical fields back to property names
fn to_property_names(object_type: &ObjectType, mut doc: ObjectData) -> ObjectData {
    for property in &object_type.data_properties {
        let field = property.field();
        if field != property.name && !doc.contains_key(&property.name) {
            if let Some(value) = doc.remove(field) {
                doc.insert(property.name.clone(), value);
            }
        }
    }
    doc
}

#[async_trait]
impl<I, V> ObjectSource for ObjectService<I, V>
where
    I: SearchIndex,
    V: ViewStore,
{
    async fn get_objects(&self, query: &ObjectQuery) -> Result<ObjectPage> {
        let object_type = &query.object_type;
        let page = if let Some(index) = object_type.search_index() {
            self.from_index(index, query).await?
        } else if let Some(view_id) = object_type.view_id() {
            self.from_view(view_id, query).await?
        } else {
            return Err(Error::BadRequest(format!(
                "object type {} has neither a search index nor a data view",
                object_type.id
            )));
        };

        tracing::debug!(
            "Fetched {} of {} objects for {}",
            page.objects.len(),
            page.total_count,
            object_type.id
        );
        Ok(page)
    }

    async fn get_view_data(&self, view_id: &str, query: &ViewQuery) -> Result<ViewData> {
        // Bridge columns carry no schema
        let resolver = PropertyResolver::schemaless();
        let rendered = render(&self.compiler, query.condition.as_ref(), &resolver).await?;
        let filter = ViewFilter {
            dsl: rendered.dsl,
            sql: rendered.sql,
        };
        self.views
            .get_view_data_by_id(view_id, &filter, query.limit)
            .await
            .map_err(Error::from)
    }
}
