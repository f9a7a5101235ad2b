use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        admin::{OrderActionRequest, OrderPageResponse, PageRequest, UserList, UserRequest},
        auth::{
            AuthenticateRequest, ForgotPasswordRequest, LoginForm, ResetPasswordRequest,
            ResetPasswordView, TokenResponse,
        },
        checkout::{CheckoutForm, Receipt, WidgetView},
    },
    models::{Customer, Order, TransactionSummary, User, Widget, WidgetSummary},
    response::{ApiResponse, Meta},
    routes::{admin, auth, checkout, health},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        // Opaque tokens issued by /api/authenticate.
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        checkout::charge_once,
        checkout::payment_succeeded,
        checkout::virtual_terminal_payment_succeeded,
        checkout::receipt,
        checkout::virtual_terminal_receipt,
        auth::login,
        auth::logout,
        auth::show_reset_password,
        auth::authenticate,
        auth::forgot_password,
        auth::reset_password,
        admin::all_sales,
        admin::all_subscriptions,
        admin::get_sale,
        admin::get_subscription,
        admin::refund,
        admin::cancel_subscription,
        admin::all_users,
        admin::one_user,
        admin::edit_user,
        admin::delete_user
    ),
    components(
        schemas(
            Widget,
            WidgetSummary,
            Customer,
            TransactionSummary,
            Order,
            User,
            CheckoutForm,
            Receipt,
            WidgetView,
            LoginForm,
            AuthenticateRequest,
            TokenResponse,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            ResetPasswordView,
            PageRequest,
            OrderPageResponse,
            OrderActionRequest,
            UserRequest,
            UserList,
            Meta,
            ApiResponse<Order>,
            ApiResponse<OrderPageResponse>,
            ApiResponse<UserList>,
            ApiResponse<Receipt>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Checkout", description = "Checkout forms and receipts"),
        (name = "Auth", description = "Login, API tokens and password reset"),
        (name = "Admin", description = "Sales, subscriptions and admin users"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
