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
        artists::{ArtistCatalog, ArtistList, ArtistsByLetter},
        auth::{AccountType, LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddCartItemRequest, CartLineDto, CartView, SetQuantityRequest},
        customers::{CustomerList, EmployeeList, SetStaffRequest, UpdateCustomerRequest},
        orders::{
            CreateOrderLineRequest, CreateOrderRequest, OrderLineView, OrderList, OrderSummary,
            OrderWithLines, UpdateOrderLineRequest, UpdateOrderRequest,
        },
        products::{
            ArtistProductGroup, CreateProductRequest, ProductList, ProductsByArtist,
            ProductsByKind, UpdateProductRequest,
        },
    },
    models::{Artist, CustomerProfile, MediaKind, Order, OrderLine, Product, User},
    response::{ApiResponse, Meta},
    routes::{admin, artists, auth, cart, health, orders, params, products},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        artists::list_artists,
        artists::artists_by_letter,
        artists::artist_catalog,
        artists::create_artist,
        artists::update_artist,
        artists::delete_artist,
        products::list_products,
        products::products_by_kind,
        products::products_by_artist,
        products::new_releases,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        cart::cart_view,
        cart::add_item,
        cart::set_quantity,
        cart::remove_item,
        orders::list_orders,
        orders::get_order,
        orders::create_order,
        orders::update_order,
        orders::delete_order,
        orders::create_order_line,
        orders::update_order_line,
        orders::delete_order_line,
        admin::list_customers,
        admin::list_employees,
        admin::update_customer,
        admin::delete_customer,
        admin::set_staff_flag,
        admin::delete_user
    ),
    components(
        schemas(
            User,
            CustomerProfile,
            Artist,
            Product,
            MediaKind,
            Order,
            OrderLine,
            AccountType,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            ArtistList,
            ArtistsByLetter,
            ArtistCatalog,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            ProductsByKind,
            ArtistProductGroup,
            ProductsByArtist,
            AddCartItemRequest,
            SetQuantityRequest,
            CartLineDto,
            CartView,
            CreateOrderRequest,
            UpdateOrderRequest,
            CreateOrderLineRequest,
            UpdateOrderLineRequest,
            OrderSummary,
            OrderList,
            OrderLineView,
            OrderWithLines,
            UpdateCustomerRequest,
            CustomerList,
            EmployeeList,
            SetStaffRequest,
            params::Pagination,
            params::ProductFilterQuery,
            params::GenreQuery,
            params::NewReleasesQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<ArtistList>,
            ApiResponse<CartView>,
            ApiResponse<OrderList>,
            ApiResponse<OrderWithLines>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration and login"),
        (name = "Artists", description = "Artist catalog endpoints"),
        (name = "Products", description = "Product catalog endpoints"),
        (name = "Cart", description = "Shopping cart endpoints"),
        (name = "Orders", description = "Order ledger endpoints (staff only)"),
        (name = "Admin", description = "Account administration endpoints (staff only)")
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
