use serde::{Deserialize, Serialize};

/// Visual style of a panel button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ButtonStyle {
    #[default]
    Primary,
    Secondary,
    Success,
    Danger,
}

/// Embed overrides for a panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelTheme {
    #[serde(default)]
    pub color: Option<u32>,
    #[serde(default, alias = "footerText")]
    pub footer_text: Option<String>,
    #[serde(default, alias = "thumbnailUrl")]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A button that opens a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonPreset {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub style: ButtonStyle,
    #[serde(default)]
    pub emoji: Option<String>,
    /// Category (or a channel inside one) to create the ticket under.
    #[serde(default, alias = "targetId")]
    pub target_id: Option<String>,
    #[serde(default, alias = "welcomeMessage")]
    pub welcome_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default, alias = "targetId")]
    pub target_id: Option<String>,
    #[serde(default, alias = "welcomeMessage")]
    pub welcome_message: Option<String>,
}

/// A select menu whose options each open a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectPreset {
    pub id: String,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub options: Vec<SelectOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelConfig {
    pub id: String,
    #[serde(default, alias = "embedTheme")]
    pub theme: Option<PanelTheme>,
    #[serde(default)]
    pub buttons: Vec<ButtonPreset>,
    #[serde(default)]
    pub selects: Vec<SelectPreset>,
}

/// What ticket creation needs from a button or select option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketPreset {
    pub id: String,
    pub label: String,
    pub target_id: Option<String>,
    pub welcome_message: Option<String>,
}

impl TicketPreset {
    /// Short kind name used in channel names: the last `:`-separated part of the id.
    pub fn kind(&self) -> &str {
        self.id.rsplit(':').next().unwrap_or(&self.id)
    }
}

impl From<&ButtonPreset> for TicketPreset {
    fn from(button: &ButtonPreset) -> Self {
        Self {
            id: button.id.clone(),
            label: button.label.clone(),
            target_id: button.target_id.clone(),
            welcome_message: button.welcome_message.clone(),
        }
    }
}

impl SelectOption {
    pub fn to_preset(&self, select_id: &str) -> TicketPreset {
        TicketPreset {
            id: format!("select:{}:{}", select_id, self.value),
            label: self.label.clone(),
            target_id: self.target_id.clone(),
            welcome_message: self.welcome_message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_json_accepts_camel_case_aliases() {
        let json = r#"{
            "id": "main",
            "embedTheme": { "color": 255, "footerText": "footer" },
            "buttons": [
                { "id": "support", "label": "Support", "style": "Danger",
                  "targetId": "100", "welcomeMessage": "hi" }
            ]
        }"#;
        let panel: PanelConfig = serde_json::from_str(json).unwrap();

        assert_eq!(panel.theme.unwrap().footer_text.as_deref(), Some("footer"));
        assert_eq!(panel.buttons[0].style, ButtonStyle::Danger);
        assert_eq!(panel.buttons[0].target_id.as_deref(), Some("100"));
        assert!(panel.selects.is_empty());
    }

    #[test]
    fn test_select_option_preset_id_and_kind() {
        let option = SelectOption {
            label: "Billing".to_string(),
            value: "billing".to_string(),
            description: None,
            emoji: None,
            target_id: Some("200".to_string()),
            welcome_message: None,
        };
        let preset = option.to_preset("topics");

        assert_eq!(preset.id, "select:topics:billing");
        assert_eq!(preset.kind(), "billing");
        assert_eq!(preset.target_id.as_deref(), Some("200"));
    }

    #[test]
    fn test_button_preset_kind_is_its_id() {
        let button = ButtonPreset {
            id: "support".to_string(),
            label: "Support".to_string(),
            style: ButtonStyle::Primary,
            emoji: None,
            target_id: None,
            welcome_message: None,
        };
        assert_eq!(TicketPreset::from(&button).kind(), "support");
    }
}
