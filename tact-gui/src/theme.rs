use embedded_graphics::pixelcolor::Rgb565;
use crate::canvas::Font;
use crate::widget::Appearance;

/// Convert 8-bit-per-channel RGB to RGB565.
pub const fn rgb(r: u8, g: u8, b: u8) -> Rgb565 {
    Rgb565::new(r >> 3, g >> 2, b >> 3)
}

const fn gray(level: u8) -> Rgb565 {
    rgb(level, level, level)
}

const ACCENT: Rgb565 = rgb(0x3d, 0xa5, 0xd9);
const ACCENT_DARKER: Rgb565 = rgb(0x1f, 0x6f, 0x99);

/// Colours and metrics shared by all widgets.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Theme {
    pub background: Rgb565,
    pub text: Rgb565,

    pub button: Rgb565,
    pub button_border: Rgb565,
    pub button_text: Rgb565,
    pub button_active: Rgb565,
    pub button_active_border: Rgb565,
    pub button_active_text: Rgb565,

    pub menu: Rgb565,
    pub menu_lighter: Rgb565,
    pub menu_text: Rgb565,
    pub menu_active: Rgb565,
    pub menu_active_lighter: Rgb565,
    pub menu_active_text: Rgb565,

    pub corner_radius: u32,
    pub font: Font,
}

impl Theme {
    /// Fill, border and text colour of a button in the given state.
    pub fn button_colors(&self, appearance: Appearance) -> (Rgb565, Rgb565, Rgb565) {
        match appearance {
            Appearance::Idle => (self.button, self.button_border, self.button_text),
            Appearance::Active | Appearance::Clicked => {
                (self.button_active, self.button_active_border, self.button_active_text)
            }
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: gray(0xff),
            text: gray(0xff),

            button: gray(50),
            button_border: gray(50),
            button_text: gray(0xff),
            button_active: ACCENT,
            button_active_border: ACCENT_DARKER,
            button_active_text: gray(0),

            menu: gray(30),
            menu_lighter: gray(50),
            menu_text: gray(0xff),
            menu_active: ACCENT_DARKER,
            menu_active_lighter: ACCENT,
            menu_active_text: gray(0),

            corner_radius: 5,
            font: Font::Regular,
        }
    }
}
