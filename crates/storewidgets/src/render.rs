use crate::quick_order::OrderFormState;
use storewidgets_core::config::OrderLabels;
use storewidgets_core::contract::{OrderFormView, PopupView};

/// Style attachment points of the popup.
pub const POPUP_HANDLES: [&str; 4] = ["popUpContainer", "popUp", "closeButton", "popUpText"];

/// Style attachment points of the quick order form.
pub const ORDER_HANDLES: [&str; 10] = [
    "quickOrderContainer",
    "quickOrderInputWrapper",
    "quickOrderInput",
    "quickOrderInputError",
    "quickOrderErrorMessage",
    "quickOrderButton",
    "quickOrderText",
    "quickOrderForm",
    "quickOrderTitle",
    "quickOrderDescription",
];

const POPUP_LINK_LABEL: &str = "view product";

/// Product listing path for a group. Falls back to `#` when no group is
/// known so the link is inert rather than pointing at the store root.
pub fn collection_href(group_id: Option<&str>) -> String {
    match group_id.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => format!("/{}?map=productClusterIds", id),
        None => "#".into(),
    }
}

pub fn popup_view(message: &str, group_id: Option<&str>) -> PopupView {
    PopupView {
        message: message.to_string(),
        href: collection_href(group_id),
        link_label: POPUP_LINK_LABEL.into(),
        handles: POPUP_HANDLES.iter().map(|h| h.to_string()).collect(),
    }
}

pub fn order_form_view(state: &OrderFormState, labels: &OrderLabels) -> OrderFormView {
    let error = state.error.map(|e| e.message(labels).to_string());
    let input_class = if error.is_some() {
        "quickOrderInput quickOrderInputError"
    } else {
        "quickOrderInput"
    };
    let button_label = if state.is_loading { &labels.loading } else { &labels.submit };

    OrderFormView {
        title: labels.title.clone(),
        description: labels.description.clone(),
        input_text: state.input_text.clone(),
        placeholder: labels.placeholder.clone(),
        input_class: input_class.into(),
        error,
        button_label: button_label.clone(),
        button_disabled: state.is_loading,
        handles: ORDER_HANDLES.iter().map(|h| h.to_string()).collect(),
    }
}
