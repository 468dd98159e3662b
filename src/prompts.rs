pub const RECIPE_SYSTEM: &str = include_str!("../data/prompts/recipe_system.txt");
pub const RECIPE_USER: &str = include_str!("../data/prompts/recipe_user.txt");
pub const MENU_SYSTEM: &str = include_str!("../data/prompts/menu_system.txt");
pub const MENU_USER: &str = include_str!("../data/prompts/menu_user.txt");
pub const DESIGN_USER: &str = include_str!("../data/prompts/design_user.txt");
pub const MENU_CARD: &str = include_str!("../data/prompts/menu_card.txt");

/// Replace `{{key}}` placeholders in a template string.
///
/// One left-to-right pass over the template: substituted values are never
/// scanned again, and unknown placeholders are kept as written.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        let Some(end) = after_open.find("}}") else {
            result.push_str(&rest[start..]);
            return result;
        };

        let key = &after_open[..end];
        match vars.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => result.push_str(value),
            None => result.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after_open[end + 2..];
    }

    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_single_var() {
        assert_eq!(
            render("Hello {{name}}!", &[("name", "world")]),
            "Hello world!"
        );
    }

    #[test]
    fn test_render_repeated_var() {
        assert_eq!(
            render("{{food}} and more {{food}}", &[("food", "ramen")]),
            "ramen and more ramen"
        );
    }

    #[test]
    fn test_render_does_not_expand_placeholders_inside_values() {
        assert_eq!(
            render(
                "Name: {{name}} Theme: {{theme}}",
                &[("name", "{{theme}} Cafe"), ("theme", "zen")]
            ),
            "Name: {{theme}} Cafe Theme: zen"
        );
    }

    #[test]
    fn test_render_keeps_unknown_and_unclosed_placeholders() {
        assert_eq!(
            render("{{missing}} and {{food", &[("food", "ramen")]),
            "{{missing}} and {{food"
        );
    }

    #[test]
    fn test_prompts_are_non_empty() {
        for prompt in [
            RECIPE_SYSTEM,
            RECIPE_USER,
            MENU_SYSTEM,
            MENU_USER,
            DESIGN_USER,
            MENU_CARD,
        ] {
            assert!(!prompt.trim().is_empty());
        }
    }

    #[test]
    fn test_recipe_user_has_placeholders() {
        for key in ["{{food}}", "{{difficulty}}", "{{servings}}", "{{dietary}}"] {
            assert!(RECIPE_USER.contains(key), "missing {}", key);
        }
    }

    #[test]
    fn test_menu_card_has_palette_placeholders() {
        for key in ["{{primary}}", "{{secondary}}", "{{accent}}", "{{background}}"] {
            assert!(MENU_CARD.contains(key), "missing {}", key);
        }
    }
}
