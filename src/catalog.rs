//! Enhancement catalog
//!
//! Maps user-chosen enhancement labels to prompt templates and groups
//! enhancements by image category. The beauty category is special: its
//! listing splits into a gender-filtered hair bucket and a neutral
//! makeup bucket instead of a flat list.

use crate::database::dao::EnhancementsDao;
use crate::database::entities::category_enhancements::{
    SUBCATEGORY_HAIR_FEMALE, SUBCATEGORY_HAIR_MALE, SUBCATEGORY_MAKEUP,
};
use crate::database::entities::Enhancement;
use crate::error::AppError;
use serde::Serialize;

pub const CATEGORY_BEAUTY: &str = "beauty";

/// Appended when several enhancements are merged into one prompt
const COHESION_SUFFIX: &str =
    "Apply all of the above effects together in a single cohesive, natural-looking result.";

#[derive(Debug, Clone, Serialize)]
pub struct CategoryInfo {
    pub code: String,
    pub enhancement_count: u64,
}

/// Listing shape returned by [`Catalog::list_enhancements`]
#[derive(Debug, Clone)]
pub enum CatalogListing {
    Flat(Vec<Enhancement>),
    Beauty {
        hair_style: Vec<Enhancement>,
        makeup: Vec<Enhancement>,
    },
}

/// Gender qualifier for the beauty hair bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn hair_subcategory(self) -> &'static str {
        match self {
            Gender::Male => SUBCATEGORY_HAIR_MALE,
            Gender::Female => SUBCATEGORY_HAIR_FEMALE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    pub fn parse_or(value: &str, default: Gender) -> Gender {
        match value.trim().to_lowercase().as_str() {
            "male" | "m" => Gender::Male,
            "female" | "f" => Gender::Female,
            _ => default,
        }
    }
}

#[derive(Clone)]
pub struct Catalog {
    enhancements: EnhancementsDao,
}

impl Catalog {
    pub fn new(enhancements: EnhancementsDao) -> Self {
        Self { enhancements }
    }

    pub async fn list_categories(&self) -> Result<Vec<CategoryInfo>, AppError> {
        let codes = self.enhancements.list_category_codes().await?;

        let mut categories = Vec::with_capacity(codes.len());
        for code in codes {
            let enhancement_count = self.enhancements.count_for_category(&code).await?;
            categories.push(CategoryInfo {
                code,
                enhancement_count,
            });
        }

        Ok(categories)
    }

    /// Active enhancements for a category. Beauty splits into buckets;
    /// every other category is a flat sorted list.
    pub async fn list_enhancements(
        &self,
        category_code: &str,
        gender: Gender,
    ) -> Result<CatalogListing, AppError> {
        let entries = self.enhancements.list_for_category(category_code).await?;

        if category_code != CATEGORY_BEAUTY {
            return Ok(CatalogListing::Flat(
                entries.into_iter().map(|e| e.enhancement).collect(),
            ));
        }

        let hair_subcategory = gender.hair_subcategory();
        let mut hair_style = Vec::new();
        let mut makeup = Vec::new();
        for entry in entries {
            match entry.subcategory.as_deref() {
                Some(sub) if sub == hair_subcategory => hair_style.push(entry.enhancement),
                Some(SUBCATEGORY_MAKEUP) => makeup.push(entry.enhancement),
                _ => {}
            }
        }

        Ok(CatalogListing::Beauty { hair_style, makeup })
    }

    /// Resolve an enhancement selector to its prompt template.
    ///
    /// Callers often only know the user-facing label, so the label is
    /// tried first, then the stable key. An unknown selector degrades
    /// to a generic instruction instead of failing the request.
    pub async fn resolve_template(&self, selector: &str) -> Result<ResolvedTemplate, AppError> {
        if let Some(enhancement) = self.enhancements.find_by_display_name(selector).await? {
            return Ok(ResolvedTemplate {
                template: enhancement.prompt_template,
                display_name: enhancement.display_name,
                enhancement_type: enhancement.enhancement_type,
                generic: false,
            });
        }

        if let Some(enhancement) = self.enhancements.find_by_type(selector).await? {
            return Ok(ResolvedTemplate {
                template: enhancement.prompt_template,
                display_name: enhancement.display_name,
                enhancement_type: enhancement.enhancement_type,
                generic: false,
            });
        }

        tracing::debug!(selector, "unknown enhancement selector, using generic template");
        Ok(ResolvedTemplate {
            template: format!(
                "Apply the following enhancement to this image: {selector}. \
                 Keep the result photorealistic and preserve the subject."
            ),
            display_name: selector.to_string(),
            enhancement_type: selector.to_string(),
            generic: true,
        })
    }

    /// Merge several resolved templates into one prompt. A single
    /// template passes through untouched; multiple become a numbered
    /// list followed by the cohesion instruction.
    pub fn combine_prompts(templates: &[String]) -> String {
        match templates {
            [] => String::new(),
            [single] => single.clone(),
            many => {
                let mut combined = String::new();
                for (i, template) in many.iter().enumerate() {
                    combined.push_str(&format!("{}. {}\n", i + 1, template));
                }
                combined.push_str(COHESION_SUFFIX);
                combined
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedTemplate {
    pub template: String,
    pub display_name: String,
    pub enhancement_type: String,
    pub generic: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_single_passthrough() {
        let templates = vec!["Remove the background".to_string()];
        assert_eq!(Catalog::combine_prompts(&templates), "Remove the background");
    }

    #[test]
    fn test_combine_multiple_numbered_with_suffix() {
        let templates = vec![
            "Remove the background".to_string(),
            "Improve lighting".to_string(),
        ];
        let combined = Catalog::combine_prompts(&templates);
        assert!(combined.contains("1. Remove the background"));
        assert!(combined.contains("2. Improve lighting"));
        assert!(combined.ends_with(COHESION_SUFFIX));
    }

    #[test]
    fn test_combine_empty() {
        assert_eq!(Catalog::combine_prompts(&[]), "");
    }

    #[test]
    fn test_gender_hair_subcategory() {
        assert_eq!(Gender::Male.hair_subcategory(), SUBCATEGORY_HAIR_MALE);
        assert_eq!(Gender::Female.hair_subcategory(), SUBCATEGORY_HAIR_FEMALE);
    }
}
