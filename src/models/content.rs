//! Singleton page-content records: about section, career hero, CTA banner,
//! footer and the stories page header.

use serde::{Deserialize, Serialize};

use super::{NewRecord, Record, Section, Sectioned};

/// The "About" page block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AboutSection {
    pub id: String,
    pub heading: String,
    #[serde(default)]
    pub subheading: String,
    #[serde(default)]
    pub story: String,
    #[serde(default)]
    pub mission: String,
    #[serde(default)]
    pub vision: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewAboutSection {
    pub heading: String,
    pub subheading: String,
    pub story: String,
    pub mission: String,
    pub vision: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl NewRecord for NewAboutSection {}

impl Record for AboutSection {
    const COLLECTION: &'static str = "about_section";
    const ASCENDING: bool = true;
    type New = NewAboutSection;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Sectioned for AboutSection {
    const SECTIONS: &'static [Section] = &[
        Section {
            key: "heading",
            label: "Heading",
            fields: &["heading", "subheading"],
        },
        Section {
            key: "story",
            label: "Story",
            fields: &["story", "image_url"],
        },
        Section {
            key: "mission",
            label: "Mission and vision",
            fields: &["mission", "vision"],
        },
    ];
}

/// Hero block at the top of the career page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CareerHero {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub cta_text: String,
    #[serde(default)]
    pub cta_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewCareerHero {
    pub title: String,
    pub subtitle: String,
    pub cta_text: String,
    pub cta_link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
}

impl NewRecord for NewCareerHero {}

impl Record for CareerHero {
    const COLLECTION: &'static str = "career_hero";
    const ASCENDING: bool = true;
    type New = NewCareerHero;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Sectioned for CareerHero {
    const SECTIONS: &'static [Section] = &[
        Section {
            key: "headline",
            label: "Headline",
            fields: &["title", "subtitle", "background_image"],
        },
        Section {
            key: "cta",
            label: "Call to action",
            fields: &["cta_text", "cta_link"],
        },
    ];
}

/// Call-to-action banner shown across public pages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CtaBanner {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub button_text: String,
    #[serde(default)]
    pub button_link: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewCtaBanner {
    pub title: String,
    pub description: String,
    pub button_text: String,
    pub button_link: String,
    pub is_active: bool,
}

impl NewRecord for NewCtaBanner {}

impl Record for CtaBanner {
    const COLLECTION: &'static str = "cta_banner";
    const ASCENDING: bool = true;
    type New = NewCtaBanner;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Sectioned for CtaBanner {
    const SECTIONS: &'static [Section] = &[
        Section {
            key: "copy",
            label: "Banner text",
            fields: &["title", "description"],
        },
        Section {
            key: "button",
            label: "Banner button",
            fields: &["button_text", "button_link", "is_active"],
        },
    ];
}

/// Site footer. The table starts empty, so the editor inserts a default row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FooterSettings {
    pub id: String,
    #[serde(default)]
    pub company_description: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub copyright_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewFooterSettings {
    pub company_description: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub copyright_text: String,
}

impl NewRecord for NewFooterSettings {}

impl Record for FooterSettings {
    const COLLECTION: &'static str = "footer_settings";
    const ASCENDING: bool = true;
    type New = NewFooterSettings;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Sectioned for FooterSettings {
    const SECTIONS: &'static [Section] = &[
        Section {
            key: "company",
            label: "Company details",
            fields: &["company_description", "copyright_text"],
        },
        Section {
            key: "contact",
            label: "Contact details",
            fields: &["address", "phone", "email"],
        },
    ];

    fn default_row() -> Option<NewFooterSettings> {
        Some(NewFooterSettings {
            company_description: "RWU Inc.".to_string(),
            copyright_text: "© RWU Inc. All rights reserved.".to_string(),
            ..Default::default()
        })
    }
}

/// Header block of the stories page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoriesSection {
    pub id: String,
    #[serde(default)]
    pub heading: String,
    #[serde(default)]
    pub intro: String,
    #[serde(default)]
    pub featured_title: String,
    #[serde(default)]
    pub featured_story: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewStoriesSection {
    pub heading: String,
    pub intro: String,
    pub featured_title: String,
    pub featured_story: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl NewRecord for NewStoriesSection {}

impl Record for StoriesSection {
    const COLLECTION: &'static str = "stories_section";
    const ASCENDING: bool = true;
    type New = NewStoriesSection;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Sectioned for StoriesSection {
    const SECTIONS: &'static [Section] = &[
        Section {
            key: "intro",
            label: "Introduction",
            fields: &["heading", "intro"],
        },
        Section {
            key: "featured",
            label: "Featured story",
            fields: &["featured_title", "featured_story", "image_url"],
        },
    ];

    fn default_row() -> Option<NewStoriesSection> {
        Some(NewStoriesSection {
            heading: "Our Stories".to_string(),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_lookup() {
        let section = AboutSection::section("mission").unwrap();
        assert_eq!(section.fields, &["mission", "vision"]);
        assert!(AboutSection::section("pricing").is_none());
    }

    #[test]
    fn test_only_footer_and_stories_auto_create() {
        assert!(FooterSettings::default_row().is_some());
        assert!(StoriesSection::default_row().is_some());
        assert!(AboutSection::default_row().is_none());
        assert!(CtaBanner::default_row().is_none());
    }

    #[test]
    fn test_every_section_field_exists_on_the_record() {
        let banner = CtaBanner {
            id: "b1".to_string(),
            title: "Join us".to_string(),
            description: String::new(),
            button_text: String::new(),
            button_link: String::new(),
            is_active: true,
            created_at: None,
        };
        let json = serde_json::to_value(&banner).unwrap();
        for section in CtaBanner::SECTIONS {
            for field in section.fields {
                assert!(json.get(*field).is_some(), "missing field {}", field);
            }
        }
    }
}
