//! Selector registry
//!
//! Semantic names for the dashboard and widget DOM, grouped by feature.
//! Scenarios reference these as `@Group.name` (e.g. `@DeploymentWizard.next_button`)
//! and [`lookup`] resolves them. Whether a selector still matches the live DOM
//! is only known when a scenario runs.

pub mod prerequisite_checklist {
    pub const CONTAINER: &str = "[data-testid='prerequisite-checklist']";
    pub const PROGRESS: &str = "[data-testid='checklist-progress']";
    pub const ITEM: &str = "[data-testid^='prerequisite-item-']";
    pub const CLOUD_ACCOUNT: &str = "[data-testid='prerequisite-item-cloudAccount'] input[type='checkbox']";
    pub const FACEBOOK_ACCOUNT: &str = "[data-testid='prerequisite-item-facebookAccount'] input[type='checkbox']";
    pub const SHOPIFY_ACCESS: &str = "[data-testid='prerequisite-item-shopifyAccess'] input[type='checkbox']";
    pub const LLM_PROVIDER_CHOICE: &str = "[data-testid='prerequisite-item-llmProviderChoice'] input[type='checkbox']";
    pub const RESET_BUTTON: &str = "button[aria-label='Reset checklist']";
    pub const CONTINUE_BUTTON: &str = "button:has-text('Continue to deployment')";

    pub const ALL: &[(&str, &str)] = &[
        ("container", CONTAINER),
        ("progress", PROGRESS),
        ("item", ITEM),
        ("cloud_account", CLOUD_ACCOUNT),
        ("facebook_account", FACEBOOK_ACCOUNT),
        ("shopify_access", SHOPIFY_ACCESS),
        ("llm_provider_choice", LLM_PROVIDER_CHOICE),
        ("reset_button", RESET_BUTTON),
        ("continue_button", CONTINUE_BUTTON),
    ];
}

pub mod deployment_wizard {
    pub const CONTAINER: &str = "[data-testid='deployment-wizard']";
    pub const PLATFORM_SELECT: &str = "select[name='platform']";
    pub const PLATFORM_OPTION: &str = "[role='option']";
    pub const DEPLOY_BUTTON: &str = "button:has-text('Deploy')";
    pub const NEXT_BUTTON: &str = "button:has-text('Next')";
    pub const BACK_BUTTON: &str = "button:has-text('Back')";
    pub const CANCEL_BUTTON: &str = "button:has-text('Cancel')";
    pub const STATUS_BADGE: &str = "[data-testid='deployment-status']";
    pub const PROGRESS_BAR: &str = "[role='progressbar']";
    pub const LOG_OUTPUT: &str = "[data-testid='deployment-logs']";
    pub const ERROR_MESSAGE: &str = "[data-testid='deployment-error']";

    pub const ALL: &[(&str, &str)] = &[
        ("container", CONTAINER),
        ("platform_select", PLATFORM_SELECT),
        ("platform_option", PLATFORM_OPTION),
        ("deploy_button", DEPLOY_BUTTON),
        ("next_button", NEXT_BUTTON),
        ("back_button", BACK_BUTTON),
        ("cancel_button", CANCEL_BUTTON),
        ("status_badge", STATUS_BADGE),
        ("progress_bar", PROGRESS_BAR),
        ("log_output", LOG_OUTPUT),
        ("error_message", ERROR_MESSAGE),
    ];
}

pub mod webhook_verification {
    pub const CONTAINER: &str = "[data-testid='webhook-verification']";
    pub const FACEBOOK_STATUS: &str = "[data-testid='webhook-status-facebook']";
    pub const SHOPIFY_STATUS: &str = "[data-testid='webhook-status-shopify']";
    pub const VERIFY_BUTTON: &str = "button:has-text('Verify webhooks')";
    pub const RESUBSCRIBE_BUTTON: &str = "button:has-text('Resubscribe')";
    pub const TEST_BUTTON: &str = "button:has-text('Send test webhook')";
    pub const LAST_VERIFIED: &str = "[data-testid='webhook-last-verified']";

    pub const ALL: &[(&str, &str)] = &[
        ("container", CONTAINER),
        ("facebook_status", FACEBOOK_STATUS),
        ("shopify_status", SHOPIFY_STATUS),
        ("verify_button", VERIFY_BUTTON),
        ("resubscribe_button", RESUBSCRIBE_BUTTON),
        ("test_button", TEST_BUTTON),
        ("last_verified", LAST_VERIFIED),
    ];
}

pub mod business_info {
    pub const FORM: &str = "[data-testid='business-info-form']";
    pub const NAME_INPUT: &str = "input[name='business_name']";
    pub const DESCRIPTION_INPUT: &str = "textarea[name='business_description']";
    pub const HOURS_INPUT: &str = "input[name='business_hours']";
    pub const SAVE_BUTTON: &str = "button:has-text('Save')";
    pub const SUCCESS_TOAST: &str = "[role='status']:has-text('saved')";
    pub const CHAR_COUNT: &str = "[data-testid='char-count']";
    pub const VALIDATION_ERROR: &str = "[role='alert']";

    pub const ALL: &[(&str, &str)] = &[
        ("form", FORM),
        ("name_input", NAME_INPUT),
        ("description_input", DESCRIPTION_INPUT),
        ("hours_input", HOURS_INPUT),
        ("save_button", SAVE_BUTTON),
        ("success_toast", SUCCESS_TOAST),
        ("char_count", CHAR_COUNT),
        ("validation_error", VALIDATION_ERROR),
    ];
}

pub mod faq {
    pub const LIST: &str = "[data-testid='faq-list']";
    pub const ITEM: &str = "[data-testid='faq-item']";
    pub const ADD_BUTTON: &str = "button:has-text('Add FAQ')";
    pub const QUESTION_INPUT: &str = "input[name='question']";
    pub const ANSWER_INPUT: &str = "textarea[name='answer']";
    pub const KEYWORDS_INPUT: &str = "input[name='keywords']";
    pub const SAVE_BUTTON: &str = "[data-testid='faq-form'] button[type='submit']";
    pub const EDIT_BUTTON: &str = "button[aria-label='Edit FAQ']";
    pub const DELETE_BUTTON: &str = "button[aria-label='Delete FAQ']";
    pub const CONFIRM_DELETE: &str = "[role='dialog'] button:has-text('Delete')";
    pub const DRAG_HANDLE: &str = "[data-testid='faq-drag-handle']";
    pub const EMPTY_STATE: &str = "[data-testid='faq-empty']";

    pub const ALL: &[(&str, &str)] = &[
        ("list", LIST),
        ("item", ITEM),
        ("add_button", ADD_BUTTON),
        ("question_input", QUESTION_INPUT),
        ("answer_input", ANSWER_INPUT),
        ("keywords_input", KEYWORDS_INPUT),
        ("save_button", SAVE_BUTTON),
        ("edit_button", EDIT_BUTTON),
        ("delete_button", DELETE_BUTTON),
        ("confirm_delete", CONFIRM_DELETE),
        ("drag_handle", DRAG_HANDLE),
        ("empty_state", EMPTY_STATE),
    ];
}

pub mod bot_personality {
    pub const CONTAINER: &str = "[data-testid='personality-config']";
    pub const FRIENDLY_OPTION: &str = "input[type='radio'][value='friendly']";
    pub const PROFESSIONAL_OPTION: &str = "input[type='radio'][value='professional']";
    pub const ENTHUSIASTIC_OPTION: &str = "input[type='radio'][value='enthusiastic']";
    pub const BOT_NAME_INPUT: &str = "input[name='bot_name']";
    pub const GREETING_INPUT: &str = "textarea[name='custom_greeting']";
    pub const GREETING_PREVIEW: &str = "[data-testid='greeting-preview']";
    pub const RESET_GREETING: &str = "button:has-text('Use default greeting')";
    pub const SAVE_BUTTON: &str = "button:has-text('Save personality')";

    pub const ALL: &[(&str, &str)] = &[
        ("container", CONTAINER),
        ("friendly_option", FRIENDLY_OPTION),
        ("professional_option", PROFESSIONAL_OPTION),
        ("enthusiastic_option", ENTHUSIASTIC_OPTION),
        ("bot_name_input", BOT_NAME_INPUT),
        ("greeting_input", GREETING_INPUT),
        ("greeting_preview", GREETING_PREVIEW),
        ("reset_greeting", RESET_GREETING),
        ("save_button", SAVE_BUTTON),
    ];
}

pub mod cost_tracking {
    pub const CONTAINER: &str = "[data-testid='cost-tracking']";
    pub const TOTAL_COST: &str = "[data-testid='total-cost']";
    pub const TOTAL_TOKENS: &str = "[data-testid='total-tokens']";
    pub const REQUEST_COUNT: &str = "[data-testid='request-count']";
    pub const DATE_RANGE: &str = "[data-testid='cost-date-range']";
    pub const PROVIDER_BREAKDOWN: &str = "[data-testid='cost-by-provider']";
    pub const TOP_CONVERSATIONS: &str = "[data-testid='top-conversations'] tbody tr";
    pub const REFRESH_BUTTON: &str = "button[aria-label='Refresh costs']";
    pub const BUDGET_WARNING: &str = "[data-testid='budget-warning']";

    pub const ALL: &[(&str, &str)] = &[
        ("container", CONTAINER),
        ("total_cost", TOTAL_COST),
        ("total_tokens", TOTAL_TOKENS),
        ("request_count", REQUEST_COUNT),
        ("date_range", DATE_RANGE),
        ("provider_breakdown", PROVIDER_BREAKDOWN),
        ("top_conversations", TOP_CONVERSATIONS),
        ("refresh_button", REFRESH_BUTTON),
        ("budget_warning", BUDGET_WARNING),
    ];
}

pub mod conversations {
    pub const LIST: &str = "[data-testid='conversation-list']";
    pub const ROW: &str = "[data-testid='conversation-row']";
    pub const SEARCH_INPUT: &str = "input[placeholder*='Search']";
    pub const STATUS_FILTER: &str = "[data-testid='filter-status']";
    pub const SENTIMENT_FILTER: &str = "[data-testid='filter-sentiment']";
    pub const HANDOFF_FILTER: &str = "[data-testid='filter-handoff']";
    pub const DATE_FROM: &str = "input[name='date_from']";
    pub const DATE_TO: &str = "input[name='date_to']";
    pub const CLEAR_FILTERS: &str = "button:has-text('Clear filters')";
    pub const PAGINATION: &str = "nav[aria-label='Pagination']";
    pub const NEXT_PAGE: &str = "button[aria-label='Next page']";
    pub const EMPTY_STATE: &str = "[data-testid='conversations-empty']";

    pub const ALL: &[(&str, &str)] = &[
        ("list", LIST),
        ("row", ROW),
        ("search_input", SEARCH_INPUT),
        ("status_filter", STATUS_FILTER),
        ("sentiment_filter", SENTIMENT_FILTER),
        ("handoff_filter", HANDOFF_FILTER),
        ("date_from", DATE_FROM),
        ("date_to", DATE_TO),
        ("clear_filters", CLEAR_FILTERS),
        ("pagination", PAGINATION),
        ("next_page", NEXT_PAGE),
        ("empty_state", EMPTY_STATE),
    ];
}

pub mod widget {
    pub const LAUNCHER: &str = "[data-testid='chat-bubble']";
    pub const WINDOW: &str = "[role='dialog'][aria-label*='chat']";
    pub const HEADER: &str = "[data-testid='widget-header']";
    pub const MESSAGE_LIST: &str = "[data-testid='message-list']";
    pub const BOT_MESSAGE: &str = "[data-testid='message-bot']";
    pub const USER_MESSAGE: &str = "[data-testid='message-user']";
    pub const INPUT: &str = "input[aria-label='Type a message']";
    pub const SEND_BUTTON: &str = "button[aria-label='Send message']";
    pub const CLOSE_BUTTON: &str = "button[aria-label='Close chat']";
    pub const TYPING_INDICATOR: &str = "[data-testid='typing-indicator']";
    pub const ERROR_BANNER: &str = "[data-testid='widget-error']";

    pub const ALL: &[(&str, &str)] = &[
        ("launcher", LAUNCHER),
        ("window", WINDOW),
        ("header", HEADER),
        ("message_list", MESSAGE_LIST),
        ("bot_message", BOT_MESSAGE),
        ("user_message", USER_MESSAGE),
        ("input", INPUT),
        ("send_button", SEND_BUTTON),
        ("close_button", CLOSE_BUTTON),
        ("typing_indicator", TYPING_INDICATOR),
        ("error_banner", ERROR_BANNER),
    ];
}

pub mod onboarding {
    pub const CONTAINER: &str = "[data-testid='onboarding']";
    pub const STEP_INDICATOR: &str = "[data-testid='onboarding-step']";
    pub const PROGRESS_TEXT: &str = "[data-testid='onboarding-progress']";
    pub const CONNECT_FACEBOOK: &str = "button:has-text('Connect Facebook')";
    pub const CONNECT_SHOPIFY: &str = "button:has-text('Connect Shopify')";
    pub const SHOP_DOMAIN_INPUT: &str = "input[name='shop_domain']";
    pub const SKIP_BUTTON: &str = "button:has-text('Skip')";
    pub const FINISH_BUTTON: &str = "button:has-text('Finish')";
    pub const TUTORIAL_LINK: &str = "a:has-text('Tutorial')";

    pub const ALL: &[(&str, &str)] = &[
        ("container", CONTAINER),
        ("step_indicator", STEP_INDICATOR),
        ("progress_text", PROGRESS_TEXT),
        ("connect_facebook", CONNECT_FACEBOOK),
        ("connect_shopify", CONNECT_SHOPIFY),
        ("shop_domain_input", SHOP_DOMAIN_INPUT),
        ("skip_button", SKIP_BUTTON),
        ("finish_button", FINISH_BUTTON),
        ("tutorial_link", TUTORIAL_LINK),
    ];
}

pub mod handoff {
    pub const QUEUE: &str = "[data-testid='handoff-queue']";
    pub const QUEUE_ITEM: &str = "[data-testid='handoff-item']";
    pub const URGENCY_BADGE: &str = "[data-testid='urgency-badge']";
    pub const REASON_LABEL: &str = "[data-testid='handoff-reason']";
    pub const UNREAD_COUNT: &str = "[data-testid='handoff-unread-count']";
    pub const RESOLVE_BUTTON: &str = "button:has-text('Mark resolved')";
    pub const TAKE_OVER_BUTTON: &str = "button:has-text('Take over')";
    pub const NOTIFICATION: &str = "[role='alert'][data-testid='handoff-notification']";

    pub const ALL: &[(&str, &str)] = &[
        ("queue", QUEUE),
        ("queue_item", QUEUE_ITEM),
        ("urgency_badge", URGENCY_BADGE),
        ("reason_label", REASON_LABEL),
        ("unread_count", UNREAD_COUNT),
        ("resolve_button", RESOLVE_BUTTON),
        ("take_over_button", TAKE_OVER_BUTTON),
        ("notification", NOTIFICATION),
    ];
}

/// Flat aliases kept for older scenarios written before the grouped tables.
pub mod mock_selectors {
    pub const CHECKLIST: &str = super::prerequisite_checklist::CONTAINER;
    pub const CHECKLIST_PROGRESS: &str = super::prerequisite_checklist::PROGRESS;
    pub const DEPLOY_BUTTON: &str = super::deployment_wizard::DEPLOY_BUTTON;
    pub const DEPLOYMENT_STATUS: &str = super::deployment_wizard::STATUS_BADGE;
    pub const WEBHOOK_STATUS: &str = super::webhook_verification::FACEBOOK_STATUS;
    pub const CHAT_BUBBLE: &str = super::widget::LAUNCHER;
    pub const CHAT_INPUT: &str = super::widget::INPUT;
    pub const SEND_BUTTON: &str = super::widget::SEND_BUTTON;

    pub const ALL: &[(&str, &str)] = &[
        ("checklist", CHECKLIST),
        ("checklist_progress", CHECKLIST_PROGRESS),
        ("deploy_button", DEPLOY_BUTTON),
        ("deployment_status", DEPLOYMENT_STATUS),
        ("webhook_status", WEBHOOK_STATUS),
        ("chat_bubble", CHAT_BUBBLE),
        ("chat_input", CHAT_INPUT),
        ("send_button", SEND_BUTTON),
    ];
}

/// Group names as scenarios spell them, paired with their tables.
pub const GROUPS: &[(&str, &[(&str, &str)])] = &[
    ("PrerequisiteChecklist", prerequisite_checklist::ALL),
    ("DeploymentWizard", deployment_wizard::ALL),
    ("WebhookVerification", webhook_verification::ALL),
    ("BusinessInfo", business_info::ALL),
    ("Faq", faq::ALL),
    ("BotPersonality", bot_personality::ALL),
    ("CostTracking", cost_tracking::ALL),
    ("Conversations", conversations::ALL),
    ("Widget", widget::ALL),
    ("Onboarding", onboarding::ALL),
    ("Handoff", handoff::ALL),
    ("mockSelectors", mock_selectors::ALL),
];

/// Resolve `"Group.name"` to its selector.
pub fn lookup(reference: &str) -> Option<&'static str> {
    let (group, name) = reference.split_once('.')?;
    GROUPS
        .iter()
        .find(|(g, _)| *g == group)
        .and_then(|(_, table)| table.iter().find(|(n, _)| *n == name))
        .map(|(_, selector)| *selector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use test_case::test_case;

    #[test_case("DeploymentWizard.next_button", deployment_wizard::NEXT_BUTTON)]
    #[test_case("PrerequisiteChecklist.progress", prerequisite_checklist::PROGRESS)]
    #[test_case("Widget.send_button", widget::SEND_BUTTON)]
    #[test_case("mockSelectors.chat_bubble", widget::LAUNCHER)]
    fn test_lookup(reference: &str, expected: &str) {
        assert_eq!(lookup(reference), Some(expected));
    }

    #[test_case("DeploymentWizard.missing")]
    #[test_case("Nope.container")]
    #[test_case("no-dot")]
    fn test_lookup_unknown(reference: &str) {
        assert_eq!(lookup(reference), None);
    }

    #[test]
    fn test_names_unique_within_groups() {
        for (group, table) in GROUPS {
            let names: HashSet<_> = table.iter().map(|(n, _)| n).collect();
            assert_eq!(names.len(), table.len(), "duplicate name in {}", group);
            assert!(table.iter().all(|(_, s)| !s.is_empty()));
        }
    }
}
