//! Defect catalogue shapes and the English/Welsh defect text builders.

use serde::{Deserialize, Serialize};

use crate::workflows::certificates::domain::{DefectLocation, DefectRecord, VehicleType};

/// Top-level inspection manual entry as served by the defects service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefectParent {
    pub im_number: u32,
    #[serde(default)]
    pub im_description: String,
    #[serde(default)]
    pub im_description_welsh: Option<String>,
    #[serde(default)]
    pub items: Vec<DefectItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefectItem {
    pub item_number: u32,
    #[serde(default)]
    pub item_description: String,
    #[serde(default)]
    pub item_description_welsh: Option<String>,
    #[serde(default)]
    pub deficiencies: Vec<DefectChild>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefectChild {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub deficiency_text: String,
    #[serde(default)]
    pub deficiency_text_welsh: Option<String>,
    #[serde(default)]
    pub for_vehicle_type: Vec<VehicleType>,
}

/// One deficiency with its parents' Welsh descriptions inlined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatDefect {
    pub reference: String,
    pub im_number: u32,
    pub item_number: u32,
    pub im_description_welsh: Option<String>,
    pub item_description_welsh: Option<String>,
    pub deficiency_text_welsh: Option<String>,
    pub for_vehicle_type: Vec<VehicleType>,
}

/// Flattened catalogue keyed by deficiency reference and vehicle type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationIndex {
    entries: Vec<FlatDefect>,
}

impl TranslationIndex {
    pub fn from_catalogue(catalogue: &[DefectParent]) -> Self {
        let entries = catalogue
            .iter()
            .flat_map(|parent| {
                parent.items.iter().flat_map(move |item| {
                    item.deficiencies.iter().map(move |child| FlatDefect {
                        reference: child.reference.clone(),
                        im_number: parent.im_number,
                        item_number: item.item_number,
                        im_description_welsh: parent.im_description_welsh.clone(),
                        item_description_welsh: item.item_description_welsh.clone(),
                        deficiency_text_welsh: child.deficiency_text_welsh.clone(),
                        for_vehicle_type: child.for_vehicle_type.clone(),
                    })
                })
            })
            .collect();

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find(&self, reference: &str, vehicle_type: VehicleType) -> Option<&FlatDefect> {
        self.entries.iter().find(|entry| {
            entry.reference == reference && entry.for_vehicle_type.contains(&vehicle_type)
        })
    }
}

/// `<ref> <item description> <deficiency text>`, then location and notes.
pub fn format_defect(defect: &DefectRecord) -> String {
    let mut text = defect.deficiency_ref.clone();
    push_word(&mut text, defect.item_description.as_deref());
    push_word(&mut text, defect.deficiency_text.as_deref());

    if let Some(location) = defect.additional_information.location.as_ref() {
        push_location(&mut text, location, &ENGLISH);
    }
    push_word(&mut text, defect.additional_information.notes.as_deref());
    text
}

/// Welsh rendering of a defect; `None` when the catalogue entry carries no Welsh item text.
pub fn format_defect_welsh(defect: &DefectRecord, translation: &FlatDefect) -> Option<String> {
    let item_description = translation.item_description_welsh.as_deref()?;

    let mut text = defect.deficiency_ref.clone();
    push_word(&mut text, Some(item_description));
    push_word(&mut text, translation.deficiency_text_welsh.as_deref());

    if let Some(location) = defect.additional_information.location.as_ref() {
        push_location(&mut text, location, &WELSH);
    }
    push_word(&mut text, defect.additional_information.notes.as_deref());
    Some(text)
}

struct LocationLabels {
    rows: &'static str,
    seats: &'static str,
    axles: &'static str,
    translate: fn(&str) -> String,
}

const ENGLISH: LocationLabels = LocationLabels {
    rows: "Rows",
    seats: "Seats",
    axles: "Axles",
    translate: english_location_word,
};

const WELSH: LocationLabels = LocationLabels {
    rows: "Rhesi",
    seats: "Seddi",
    axles: "Echelau",
    translate: welsh_location_word,
};

fn english_location_word(word: &str) -> String {
    word.to_string()
}

fn welsh_location_word(word: &str) -> String {
    match word.trim().to_ascii_lowercase().as_str() {
        "front" => "blaen",
        "rear" => "cefn",
        "upper" => "uchaf",
        "lower" => "isaf",
        "nearside" => "ochr mewnol",
        "offside" => "allanol",
        "centre" => "canol",
        "inner" => "mewnol",
        "outer" => "allanol",
        _ => return word.to_string(),
    }
    .to_string()
}

fn push_word(text: &mut String, word: Option<&str>) {
    if let Some(word) = word.map(str::trim).filter(|word| !word.is_empty()) {
        text.push(' ');
        text.push_str(word);
    }
}

fn push_location(text: &mut String, location: &DefectLocation, labels: &LocationLabels) {
    let words = [
        &location.vertical,
        &location.horizontal,
        &location.lateral,
        &location.longitudinal,
    ];
    let numbers = [
        (labels.rows, location.row_number),
        (labels.seats, location.seat_number),
        (labels.axles, location.axle_number),
    ];

    let start = text.len();
    for word in words.into_iter().flatten() {
        push_word(text, Some(&(labels.translate)(word)));
    }
    for (label, value) in numbers {
        if let Some(value) = value {
            text.push_str(&format!(" {label}: {value}."));
        }
    }

    if text.len() > start && !text.ends_with('.') {
        text.push('.');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::certificates::domain::AdditionalInformation;

    fn defect() -> DefectRecord {
        DefectRecord {
            im_number: Some(1),
            im_description: Some("Registration Plate".to_string()),
            item_number: Some(1),
            item_description: Some("A registration plate:".to_string()),
            deficiency_ref: "1.1.a".to_string(),
            deficiency_category: "major".to_string(),
            deficiency_text: Some("missing.".to_string()),
            prs: false,
            additional_information: AdditionalInformation {
                location: Some(DefectLocation {
                    vertical: None,
                    horizontal: None,
                    lateral: Some("nearside".to_string()),
                    longitudinal: Some("front".to_string()),
                    row_number: None,
                    seat_number: None,
                    axle_number: Some(2),
                }),
                notes: Some("None".to_string()),
            },
        }
    }

    fn catalogue() -> Vec<DefectParent> {
        vec![DefectParent {
            im_number: 1,
            im_description: "Registration Plate".to_string(),
            im_description_welsh: Some("Plât cofrestru".to_string()),
            items: vec![DefectItem {
                item_number: 1,
                item_description: "A registration plate:".to_string(),
                item_description_welsh: Some("Plât cofrestru:".to_string()),
                deficiencies: vec![DefectChild {
                    reference: "1.1.a".to_string(),
                    deficiency_text: "missing.".to_string(),
                    deficiency_text_welsh: Some("ar goll.".to_string()),
                    for_vehicle_type: vec![VehicleType::Psv, VehicleType::Hgv],
                }],
            }],
        }]
    }

    #[test]
    fn english_text_includes_location_and_notes() {
        assert_eq!(
            format_defect(&defect()),
            "1.1.a A registration plate: missing. nearside front Axles: 2. None"
        );
    }

    #[test]
    fn welsh_text_translates_location_words() {
        let index = TranslationIndex::from_catalogue(&catalogue());
        let entry = index.find("1.1.a", VehicleType::Psv).expect("entry for psv");

        assert_eq!(
            format_defect_welsh(&defect(), entry).as_deref(),
            Some("1.1.a Plât cofrestru: ar goll. ochr mewnol blaen Echelau: 2. None")
        );
    }

    #[test]
    fn lookup_respects_vehicle_type() {
        let index = TranslationIndex::from_catalogue(&catalogue());
        assert_eq!(index.len(), 1);
        assert!(index.find("1.1.a", VehicleType::Trl).is_none());
        assert!(index.find("9.9.z", VehicleType::Psv).is_none());
    }

    #[test]
    fn location_without_axle_gets_closing_period() {
        let mut record = defect();
        if let Some(location) = record.additional_information.location.as_mut() {
            location.axle_number = None;
        }
        record.additional_information.notes = None;

        assert_eq!(
            format_defect(&record),
            "1.1.a A registration plate: missing. nearside front."
        );
    }
}
