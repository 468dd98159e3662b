use crate::ai::{GenerationClient, GenerationRequest};
use crate::models::{GeneratedImage, Menu, MenuDesign, MenuRequest, MENU_LAYOUTS, PRICE_RANGES};
use crate::pipeline::{Pipeline, Step};
use crate::shape::ExpectedShape;
use crate::{prompts, Result};
use std::sync::Arc;

pub const MENU_STEP: &str = "menu";
pub const DESIGN_STEP: &str = "design";
pub const CARD_STEP: &str = "card";

/// Input of the design step: the original request plus the generated menu.
#[derive(Debug, Clone)]
pub struct DesignInput {
    pub request: MenuRequest,
    pub menu: Menu,
}

#[derive(Debug, Clone)]
pub struct CardInput {
    pub menu: Menu,
    pub design: MenuDesign,
}

pub fn menu_item_shape() -> ExpectedShape {
    ExpectedShape::new("menuItem")
        .string("name")
        .string("description")
        .string("price")
}

pub fn menu_shape() -> ExpectedShape {
    ExpectedShape::new("menu")
        .string("name")
        .string("tagline")
        .string("description")
        .enumeration("priceRange", PRICE_RANGES)
        .sequence("appetizers", menu_item_shape())
        .sequence("mainCourses", menu_item_shape())
        .sequence("desserts", menu_item_shape())
        .sequence("beverages", menu_item_shape())
        .optional_string("specialFeature")
        .optional_string("chefNote")
}

pub fn design_shape() -> ExpectedShape {
    ExpectedShape::new("menuDesign")
        .string("style")
        .enumeration("layout", MENU_LAYOUTS)
        .nested(
            "colorPalette",
            ExpectedShape::new("colorPalette")
                .string("primary")
                .string("secondary")
                .string("accent")
                .string("background"),
        )
        .nested(
            "typography",
            ExpectedShape::new("typography")
                .string("headingFont")
                .string("bodyFont"),
        )
        .string_list("decorativeElements")
        .string("imagePrompt")
}

pub fn card_shape() -> ExpectedShape {
    ExpectedShape::new("menuCard")
        .string("mimeType")
        .string("data")
}

pub fn menu_request(input: &MenuRequest) -> GenerationRequest {
    let prompt = prompts::render(
        prompts::MENU_USER,
        &[
            ("name", input.name.trim()),
            ("theme", input.theme.trim()),
            ("cuisine", input.cuisine_type.trim()),
            ("price_range", input.price_range_or_default()),
            ("atmosphere", input.atmosphere_or_default()),
            ("special_feature", input.special_feature().unwrap_or("none")),
        ],
    );

    GenerationRequest::text(prompt).with_system(prompts::MENU_SYSTEM)
}

pub fn design_request(input: &DesignInput) -> GenerationRequest {
    let dishes = input.menu.dish_names().join(", ");
    let prompt = prompts::render(
        prompts::DESIGN_USER,
        &[
            ("name", &input.menu.name),
            ("tagline", &input.menu.tagline),
            ("theme", input.request.theme.trim()),
            ("cuisine", input.request.cuisine_type.trim()),
            ("atmosphere", input.request.atmosphere_or_default()),
            ("dishes", &dishes),
        ],
    );

    GenerationRequest::text(prompt).with_system(prompts::MENU_SYSTEM)
}

pub fn card_request(input: &CardInput) -> GenerationRequest {
    let design = &input.design;
    let decorations = design.decorative_elements.join(", ");
    let dishes = input.menu.dish_names().join(", ");
    let prompt = prompts::render(
        prompts::MENU_CARD,
        &[
            ("name", &input.menu.name),
            ("tagline", &input.menu.tagline),
            ("image_prompt", &design.image_prompt),
            ("style", &design.style),
            ("layout", &design.layout),
            ("primary", &design.color_palette.primary),
            ("secondary", &design.color_palette.secondary),
            ("accent", &design.color_palette.accent),
            ("background", &design.color_palette.background),
            ("heading_font", &design.typography.heading_font),
            ("body_font", &design.typography.body_font),
            ("decorations", &decorations),
            ("dishes", &dishes),
        ],
    );

    GenerationRequest::image(prompt)
}

/// Keep the requested name and special feature when the model drops them.
fn keep_requested_identity(input: &MenuRequest, mut menu: Menu) -> Menu {
    if menu.name.trim().is_empty() {
        menu.name = input.name.trim().to_string();
    }
    if menu.special_feature.is_none() {
        menu.special_feature = input.special_feature().map(str::to_string);
    }
    menu
}

pub fn menu_step() -> Step<MenuRequest, Menu> {
    Step::new(menu_shape(), menu_request).with_normalizer(keep_requested_identity)
}

pub fn design_step() -> Step<DesignInput, MenuDesign> {
    Step::new(design_shape(), design_request)
}

pub fn card_step() -> Step<CardInput, GeneratedImage> {
    Step::new(card_shape(), card_request)
}

/// `menu` then `design`, plus the `card` image step when `include_card` is set.
pub fn menu_pipeline(
    client: Arc<dyn GenerationClient>,
    include_card: bool,
) -> Result<Pipeline<MenuRequest>> {
    let name = if include_card { "menu-card" } else { "menu" };
    let builder = Pipeline::<MenuRequest>::builder(name, client)
        .validate_input(MenuRequest::validate)
        .stage(MENU_STEP, menu_step(), |ctx| Ok(ctx.input().clone()))
        .stage(DESIGN_STEP, design_step(), |ctx| {
            Ok(DesignInput {
                request: ctx.input().clone(),
                menu: ctx.get::<Menu>(MENU_STEP)?.clone(),
            })
        });

    let builder = if include_card {
        builder.stage(CARD_STEP, card_step(), |ctx| {
            Ok(CardInput {
                menu: ctx.get::<Menu>(MENU_STEP)?.clone(),
                design: ctx.get::<MenuDesign>(DESIGN_STEP)?.clone(),
            })
        })
    } else {
        builder
    };

    builder.build()
}
