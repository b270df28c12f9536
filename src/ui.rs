use crate::Message;
use iced::widget::{Button, button, container, text};
use iced::{Border, Theme};

pub fn neutral_button_style(theme: &Theme, status: button::Status) -> button::Style {
    let palette = theme.extended_palette();
    let base = button::Style {
        text_color: palette.background.weak.text,
        ..Default::default()
    };
    match status {
        button::Status::Hovered | button::Status::Pressed => button::Style {
            background: Some(palette.background.strong.color.into()),
            ..base
        },
        button::Status::Disabled => button::Style {
            text_color: palette.background.strong.color,
            ..base
        },
        button::Status::Active => base,
    }
}

/// Toolbar button; `None` renders it disabled.
pub fn toolbar_button(label: &str, on_press: Option<Message>) -> Button<'_, Message> {
    button(text(label).size(12))
        .padding([4, 10])
        .style(neutral_button_style)
        .on_press_maybe(on_press)
}

pub fn panel_style(theme: &Theme) -> container::Style {
    let palette = theme.extended_palette();
    container::Style::default()
        .background(palette.background.base.color)
        .border(Border {
            color: palette.background.strong.color,
            width: 1.0,
            ..Default::default()
        })
}
