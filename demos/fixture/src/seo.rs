//! Single-entity operations on [`SeoEntity`].
//!
//! Every method requires a logged-in player and only sees that player's
//! entities.

use serde::{Deserialize, Serialize};

use backend_entity::{Entity, EntityId};
use backend_facet::{Facet, FacetBuilder, FacetContext};

/// Enumeration stored by its literal value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum SeoEnum {
    #[default]
    A = 1,
    B = 2,
    C = 3,
}

impl From<SeoEnum> for u8 {
    fn from(value: SeoEnum) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for SeoEnum {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::A),
            2 => Ok(Self::B),
            3 => Ok(Self::C),
            other => Err(format!("{other} is not a SeoEnum value")),
        }
    }
}

/// An entity with one string and one enum attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoEntity {
    #[serde(default)]
    pub string_attribute: Option<String>,
    #[serde(default)]
    pub enum_attribute: SeoEnum,
}

impl Entity for SeoEntity {
    fn type_name() -> &'static str {
        "SeoEntity"
    }
}

/// Create, read, update and delete [`SeoEntity`] records.
pub struct SeoFacet;

impl Facet for SeoFacet {
    const NAME: &'static str = "SeoFacet";

    fn methods(builder: FacetBuilder) -> FacetBuilder {
        builder
            .authenticated_method("Create", create)
            .authenticated_method("Get", get)
            .authenticated_method("FindByString", find_by_string)
            .authenticated_method("All", all)
            .authenticated_method("Update", update)
            .authenticated_method("Delete", delete)
    }
}

async fn create(ctx: FacetContext, (entity,): (SeoEntity,)) -> anyhow::Result<EntityId> {
    ctx.create(&entity).await
}

async fn get(ctx: FacetContext, (id,): (EntityId,)) -> anyhow::Result<Option<SeoEntity>> {
    let found = ctx.entities().await.find::<SeoEntity>(&id).await?;
    Ok(found.map(|p| p.into_inner()))
}

async fn find_by_string(ctx: FacetContext, (value,): (String,)) -> anyhow::Result<Option<SeoEntity>> {
    let found = ctx
        .entities()
        .await
        .request_where::<SeoEntity>("string_attribute", value)
        .await?;
    Ok(found.into_iter().next().map(|p| p.into_inner()))
}

async fn all(ctx: FacetContext, (): ()) -> anyhow::Result<Vec<SeoEntity>> {
    let all = ctx.entities().await.request_all::<SeoEntity>().await?;
    Ok(all.into_iter().map(|p| p.into_inner()).collect())
}

async fn update(ctx: FacetContext, (id, entity): (EntityId, SeoEntity)) -> anyhow::Result<()> {
    ctx.update(&id, &entity).await
}

async fn delete(ctx: FacetContext, (id,): (EntityId,)) -> anyhow::Result<()> {
    ctx.delete(&id).await
}
