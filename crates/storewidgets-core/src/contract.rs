use crate::config::PopupConfig;
use crate::matcher::{coerce_integer, CurrentVariant};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// --- host product context ---

/// The slice of the host's product context the widgets read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductContext {
    #[serde(default)]
    pub selected_item: Option<SelectedItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedItem {
    #[serde(default)]
    pub reference_id: Vec<ReferenceValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceValue {
    #[serde(rename = "Key", default)]
    pub key: String,
    #[serde(rename = "Value", default)]
    pub value: Value,
}

impl CurrentVariant for ProductContext {
    /// First reference value coerced to an integer.
    fn current_variant(&self) -> Option<i64> {
        let first = self.selected_item.as_ref()?.reference_id.first()?;
        coerce_integer(&first.value)
    }
}

// --- catalog lookup ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupRequest {
    pub sku: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupResponse {
    #[serde(default)]
    pub product: Option<ProductRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRef {
    #[serde(rename = "productId", default)]
    pub product_id: Option<String>,
}

impl LookupResponse {
    /// The resolved product id, if the lookup found one.
    pub fn product_id(&self) -> Option<&str> {
        self.product
            .as_ref()?
            .product_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
    }
}

// --- cart mutation ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMutation {
    pub sales_channel: String,
    pub items: Vec<CartItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: i64,
    pub quantity: u32,
    pub seller: String,
}

// --- view models ---

/// What the popup presenter renders while visible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopupView {
    pub message: String,
    pub href: String,
    pub link_label: String,
    /// Style attachment points exposed to the host theme.
    pub handles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFormView {
    pub title: String,
    pub description: String,
    pub input_text: String,
    pub placeholder: String,
    pub input_class: String,
    pub error: Option<String>,
    pub button_label: String,
    pub button_disabled: bool,
    pub handles: Vec<String>,
}

// --- host <-> widgets protocol (JSON lines) ---

/// Messages from the host page to the widgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HostEvent {
    #[serde(rename = "mount_popup")]
    MountPopup,
    #[serde(rename = "unmount_popup")]
    UnmountPopup,
    /// Popup block props changed (a re-render with new props).
    #[serde(rename = "configure_popup")]
    ConfigurePopup { config: PopupConfig },
    /// The host's product context changed.
    #[serde(rename = "select_variant")]
    SelectVariant { context: ProductContext },
    /// User clicked the popup's close button.
    #[serde(rename = "dismiss_popup")]
    DismissPopup,
    /// Keystroke in the quick order input.
    #[serde(rename = "input_change")]
    InputChange { text: String },
    #[serde(rename = "submit_order")]
    SubmitOrder,
}

/// Messages from the widgets to the host page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WidgetMsg {
    /// `None` renders nothing.
    #[serde(rename = "render_popup")]
    RenderPopup { view: Option<PopupView> },
    #[serde(rename = "render_order_form")]
    RenderOrderForm { view: OrderFormView },
    /// Full-page navigation.
    #[serde(rename = "navigate")]
    Navigate { path: String },
}

/// Serialize a message as a JSON line (with trailing newline).
pub fn encode(msg: &impl Serialize) -> String {
    let mut s = serde_json::to_string(msg).expect("serialize widget message");
    s.push('\n');
    s
}

/// Deserialize a JSON line. Returns None on empty/whitespace input.
pub fn decode_host(line: &str) -> Option<HostEvent> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}

pub fn decode_widget(line: &str) -> Option<WidgetMsg> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}
