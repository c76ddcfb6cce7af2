use crate::error::{BackendError, OrderError};
use crate::render;
use storewidgets_core::config::QuickOrderConfig;
use storewidgets_core::contract::{CartItem, CartMutation, LookupRequest, LookupResponse, OrderFormView};
use tracing::{debug, info, warn};

/// Identifies one submission so late settlements can be matched to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionId(u64);

/// Actions that the widget wants the host to perform.
#[derive(Debug)]
pub enum Action {
    /// Run a catalog lookup and report back via `lookup_settled`.
    Lookup {
        submission: SubmissionId,
        request: LookupRequest,
    },
    /// Run the cart mutation and report back via `cart_settled`.
    AddToCart {
        submission: SubmissionId,
        mutation: CartMutation,
    },
    /// Full-page navigation.
    Navigate(String),
    Render(OrderFormView),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFormState {
    pub input_text: String,
    pub error: Option<OrderError>,
    pub is_loading: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    Idle,
    LookingUp(SubmissionId),
    AddingToCart(SubmissionId),
}

/// The quick order form. Only one submission may be in flight: a submit
/// while a lookup or cart mutation is pending is rejected.
pub struct QuickOrderWidget {
    config: QuickOrderConfig,
    state: OrderFormState,
    stage: Stage,
    next_submission: u64,
}

impl QuickOrderWidget {
    pub fn new(config: QuickOrderConfig) -> Self {
        Self {
            config,
            state: OrderFormState::default(),
            stage: Stage::Idle,
            next_submission: 0,
        }
    }

    pub fn state(&self) -> &OrderFormState {
        &self.state
    }

    pub fn view(&self) -> OrderFormView {
        render::order_form_view(&self.state, &self.config.labels)
    }

    /// Keystroke in the input. Always clears the inline error.
    pub fn input_change(&mut self, text: String) -> Vec<Action> {
        self.state.input_text = text;
        if self.state.error.take().is_some() {
            debug!("error cleared by input change");
        }
        vec![Action::Render(self.view())]
    }

    pub fn submit(&mut self) -> Vec<Action> {
        if self.stage != Stage::Idle {
            debug!(stage = ?self.stage, "submission rejected: previous one still in flight");
            return Vec::new();
        }

        let code = self.state.input_text.trim();
        if code.is_empty() {
            debug!("submission rejected: no code entered");
            self.state.error = Some(OrderError::Validation);
            return vec![Action::Render(self.view())];
        }

        self.next_submission += 1;
        let submission = SubmissionId(self.next_submission);
        let request = LookupRequest { sku: code.to_string() };
        info!(submission = submission.0, sku = %request.sku, "looking up product");

        self.stage = Stage::LookingUp(submission);
        self.state.is_loading = true;
        self.state.error = None;
        vec![
            Action::Lookup { submission, request },
            Action::Render(self.view()),
        ]
    }

    /// The catalog lookup settled. Results are applied even if the input was
    /// edited in the meantime.
    pub fn lookup_settled(
        &mut self,
        submission: SubmissionId,
        result: Result<LookupResponse, BackendError>,
    ) -> Vec<Action> {
        if self.stage != Stage::LookingUp(submission) {
            debug!(submission = submission.0, "ignoring lookup result for unknown submission");
            return Vec::new();
        }

        let product_id = match result {
            Ok(response) => response.product_id().map(str::to_owned),
            Err(e) => {
                warn!(submission = submission.0, error = %e, "catalog lookup failed");
                None
            }
        };

        let Some(item_id) = product_id.as_deref().and_then(parse_item_id) else {
            debug!(submission = submission.0, ?product_id, "no usable product for code");
            return self.fail(OrderError::NotFound);
        };

        let mutation = CartMutation {
            sales_channel: self.config.sales_channel.clone(),
            items: vec![CartItem {
                id: item_id,
                quantity: 1,
                seller: self.config.seller.clone(),
            }],
        };
        info!(submission = submission.0, item_id, "adding product to cart");

        self.stage = Stage::AddingToCart(submission);
        self.state.error = None;
        vec![
            Action::AddToCart { submission, mutation },
            Action::Render(self.view()),
        ]
    }

    /// The cart mutation settled. Success navigates to checkout; failure is
    /// surfaced inline and re-enables the form.
    pub fn cart_settled(&mut self, submission: SubmissionId, result: Result<(), BackendError>) -> Vec<Action> {
        if self.stage != Stage::AddingToCart(submission) {
            debug!(submission = submission.0, "ignoring cart result for unknown submission");
            return Vec::new();
        }

        match result {
            Ok(()) => {
                info!(submission = submission.0, path = %self.config.checkout_path, "redirecting to checkout");
                self.stage = Stage::Idle;
                self.state.is_loading = false;
                vec![
                    Action::Navigate(self.config.checkout_path.clone()),
                    Action::Render(self.view()),
                ]
            }
            Err(e) => {
                warn!(submission = submission.0, error = %e, "add to cart failed");
                self.fail(OrderError::CartFailed)
            }
        }
    }

    fn fail(&mut self, error: OrderError) -> Vec<Action> {
        self.stage = Stage::Idle;
        self.state.is_loading = false;
        self.state.error = Some(error);
        vec![Action::Render(self.view())]
    }
}

/// Leading integer of a product id, the way the storefront reads it
/// (`"998"` and `"998-A"` both give 998).
fn parse_item_id(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let sign_len = usize::from(trimmed.starts_with(['-', '+']));
    let digits = trimmed[sign_len..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(trimmed.len(), |end| end + sign_len);
    trimmed[..digits].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use storewidgets_core::contract::ProductRef;

    fn make_widget() -> QuickOrderWidget {
        QuickOrderWidget::new(QuickOrderConfig::default())
    }

    fn found(product_id: &str) -> Result<LookupResponse, BackendError> {
        Ok(LookupResponse {
            product: Some(ProductRef { product_id: Some(product_id.into()) }),
        })
    }

    fn not_found() -> Result<LookupResponse, BackendError> {
        Ok(LookupResponse { product: None })
    }

    fn lookup_of(actions: &[Action]) -> Option<(SubmissionId, &LookupRequest)> {
        actions.iter().find_map(|a| match a {
            Action::Lookup { submission, request } => Some((*submission, request)),
            _ => None,
        })
    }

    fn mutation_of(actions: &[Action]) -> Option<&CartMutation> {
        actions.iter().find_map(|a| match a {
            Action::AddToCart { mutation, .. } => Some(mutation),
            _ => None,
        })
    }

    fn navigation_of(actions: &[Action]) -> Option<&str> {
        actions.iter().find_map(|a| match a {
            Action::Navigate(path) => Some(path.as_str()),
            _ => None,
        })
    }

    fn last_view(actions: &[Action]) -> Option<&OrderFormView> {
        actions.iter().rev().find_map(|a| match a {
            Action::Render(view) => Some(view),
            _ => None,
        })
    }

    /// Type `code`, submit, and return the dispatched submission.
    fn submit_code(widget: &mut QuickOrderWidget, code: &str) -> SubmissionId {
        widget.input_change(code.into());
        let actions = widget.submit();
        lookup_of(&actions).expect("lookup should be dispatched").0
    }

    // === Validation ===

    #[test]
    fn whitespace_input_fails_validation_without_lookup() {
        let mut widget = make_widget();
        widget.input_change("  ".into());
        let actions = widget.submit();

        assert!(lookup_of(&actions).is_none(), "no lookup for blank input");
        assert_eq!(widget.state().error, Some(OrderError::Validation));
        assert!(!widget.state().is_loading);
        let view = last_view(&actions).expect("should re-render synchronously");
        assert_eq!(view.error.as_deref(), Some("no code entered"));
        assert!(!view.button_disabled);
    }

    #[test]
    fn empty_input_fails_validation() {
        let mut widget = make_widget();
        let actions = widget.submit();
        assert!(lookup_of(&actions).is_none());
        assert_eq!(widget.state().error, Some(OrderError::Validation));
    }

    #[test]
    fn input_change_clears_any_error() {
        for error in [OrderError::Validation, OrderError::NotFound, OrderError::CartFailed] {
            let mut widget = make_widget();
            widget.state.error = Some(error);
            let actions = widget.input_change("1".into());
            assert_eq!(widget.state().error, None);
            assert_eq!(last_view(&actions).unwrap().error, None);
        }
    }

    // === Lookup dispatch ===

    #[test]
    fn submit_dispatches_trimmed_lookup_and_sets_loading() {
        let mut widget = make_widget();
        widget.input_change("  12345 ".into());
        let actions = widget.submit();

        let (_, request) = lookup_of(&actions).expect("lookup dispatched");
        assert_eq!(request.sku, "12345");
        assert!(widget.state().is_loading);
        let view = last_view(&actions).unwrap();
        assert!(view.button_disabled);
        assert_eq!(view.button_label, "loading");
    }

    #[test]
    fn submit_clears_previous_error() {
        let mut widget = make_widget();
        widget.submit();
        assert_eq!(widget.state().error, Some(OrderError::Validation));
        widget.state.input_text = "12345".into();
        widget.submit();
        assert_eq!(widget.state().error, None);
    }

    #[test]
    fn second_submit_while_in_flight_is_rejected() {
        let mut widget = make_widget();
        submit_code(&mut widget, "12345");
        widget.input_change("67890".into());
        assert!(widget.submit().is_empty());
        assert!(widget.state().is_loading);
    }

    // === Found: cart mutation then checkout ===

    #[test]
    fn found_product_adds_single_line_then_navigates() {
        let mut widget = make_widget();
        let submission = submit_code(&mut widget, "12345");

        let actions = widget.lookup_settled(submission, found("998"));
        let mutation = mutation_of(&actions).expect("cart mutation dispatched");
        assert_eq!(mutation.sales_channel, "1");
        assert_eq!(
            mutation.items,
            vec![CartItem { id: 998, quantity: 1, seller: "1".into() }]
        );
        assert_eq!(widget.state().error, None);
        assert!(widget.state().is_loading, "stays loading while the mutation runs");

        let actions = widget.cart_settled(submission, Ok(()));
        assert_eq!(navigation_of(&actions), Some("/checkout"));
        assert!(!widget.state().is_loading);
    }

    #[test]
    fn configured_constants_flow_into_mutation() {
        let config = QuickOrderConfig {
            sales_channel: "2".into(),
            seller: "acme".into(),
            checkout_path: "/checkout/#/cart".into(),
            ..QuickOrderConfig::default()
        };
        let mut widget = QuickOrderWidget::new(config);
        let submission = submit_code(&mut widget, "1");
        let actions = widget.lookup_settled(submission, found("5"));
        let mutation = mutation_of(&actions).unwrap();
        assert_eq!(mutation.sales_channel, "2");
        assert_eq!(mutation.items[0].seller, "acme");
        let actions = widget.cart_settled(submission, Ok(()));
        assert_eq!(navigation_of(&actions), Some("/checkout/#/cart"));
    }

    // === Not found ===

    #[test]
    fn missing_product_shows_not_found() {
        let mut widget = make_widget();
        let submission = submit_code(&mut widget, "00000");

        let actions = widget.lookup_settled(submission, not_found());
        assert!(mutation_of(&actions).is_none());
        assert_eq!(widget.state().error, Some(OrderError::NotFound));
        assert!(!widget.state().is_loading);
        assert_eq!(last_view(&actions).unwrap().error.as_deref(), Some("code not found"));
    }

    #[test]
    fn lookup_transport_failure_collapses_to_not_found() {
        let mut widget = make_widget();
        let submission = submit_code(&mut widget, "12345");
        let actions = widget.lookup_settled(submission, Err(BackendError::GraphQl("boom".into())));
        assert!(mutation_of(&actions).is_none());
        assert_eq!(widget.state().error, Some(OrderError::NotFound));
        assert!(!widget.state().is_loading);
    }

    #[test]
    fn non_numeric_product_id_is_not_found() {
        let mut widget = make_widget();
        let submission = submit_code(&mut widget, "12345");
        let actions = widget.lookup_settled(submission, found("abc"));
        assert!(mutation_of(&actions).is_none());
        assert_eq!(widget.state().error, Some(OrderError::NotFound));
    }

    // === Cart failure no longer hangs the form ===

    #[test]
    fn cart_failure_surfaces_error_and_resets_loading() {
        let mut widget = make_widget();
        let submission = submit_code(&mut widget, "12345");
        widget.lookup_settled(submission, found("998"));

        let actions = widget.cart_settled(submission, Err(BackendError::GraphQl("cart locked".into())));
        assert!(navigation_of(&actions).is_none());
        assert_eq!(widget.state().error, Some(OrderError::CartFailed));
        assert!(!widget.state().is_loading);
        let view = last_view(&actions).unwrap();
        assert!(!view.button_disabled);
        assert_eq!(view.error.as_deref(), Some("could not add the product to the cart"));
    }

    #[test]
    fn form_accepts_new_submission_after_failure() {
        let mut widget = make_widget();
        let first = submit_code(&mut widget, "00000");
        widget.lookup_settled(first, not_found());
        let second = submit_code(&mut widget, "12345");
        assert_ne!(first, second);
    }

    // === Stale and unknown settlements ===

    #[test]
    fn result_is_applied_even_after_input_edit() {
        let mut widget = make_widget();
        let submission = submit_code(&mut widget, "12345");
        widget.input_change("something else".into());
        let actions = widget.lookup_settled(submission, found("998"));
        assert!(mutation_of(&actions).is_some());
    }

    #[test]
    fn settlements_for_unknown_submissions_are_ignored() {
        let mut widget = make_widget();
        let first = submit_code(&mut widget, "1");
        widget.lookup_settled(first, not_found());

        assert!(widget.lookup_settled(first, found("998")).is_empty());
        assert!(widget.cart_settled(first, Ok(())).is_empty());
        assert_eq!(widget.state().error, Some(OrderError::NotFound));
    }

    #[test]
    fn cart_result_before_lookup_is_ignored() {
        let mut widget = make_widget();
        let submission = submit_code(&mut widget, "1");
        assert!(widget.cart_settled(submission, Ok(())).is_empty());
        assert!(widget.state().is_loading);
    }

    // === Product id parsing ===

    #[test]
    fn parse_item_id_reads_leading_integer() {
        assert_eq!(parse_item_id("998"), Some(998));
        assert_eq!(parse_item_id(" 998"), Some(998));
        assert_eq!(parse_item_id("998-A"), Some(998));
        assert_eq!(parse_item_id("-4"), Some(-4));
        assert_eq!(parse_item_id("abc"), None);
        assert_eq!(parse_item_id(""), None);
        assert_eq!(parse_item_id("-"), None);
    }
}
