pub const DEFAULT_WINDOW_SIZE: (i32, i32) = (1024, 576);
pub const DEFAULT_BUFFER_COUNT: u32 = 2;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandLine {
    pub use_warp_device: bool,
    pub disable_debug_layer: bool,
}

impl CommandLine {
    /// Parses `-flag` or `/flag` style arguments, ignoring case. The program
    /// name must already be stripped.
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut command_line = CommandLine::default();

        for arg in args {
            let arg = arg.as_ref();
            let Some(flag) = arg.strip_prefix('-').or_else(|| arg.strip_prefix('/')) else {
                log::warn!("ignoring unknown argument {arg:?}");
                continue;
            };

            if flag.eq_ignore_ascii_case("warp") {
                command_line.use_warp_device = true;
            } else if flag.eq_ignore_ascii_case("nodebug") {
                command_line.disable_debug_layer = true;
            } else {
                log::warn!("ignoring unknown argument {arg:?}");
            }
        }

        command_line
    }

    pub fn debug_layer_enabled(&self) -> bool {
        cfg!(debug_assertions) && !self.disable_debug_layer
    }
}

pub fn build_command_line() -> CommandLine {
    CommandLine::parse(std::env::args().skip(1))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClearColor(pub [f32; 4]);

impl Default for ClearColor {
    fn default() -> Self {
        ClearColor([0.4, 0.6, 0.9, 1.0])
    }
}

impl ClearColor {
    pub fn as_array(&self) -> &[f32; 4] {
        &self.0
    }
}

#[derive(Clone, Debug)]
pub struct SampleConfig {
    pub title: String,
    /// Client area size in pixels.
    pub window_size: (i32, i32),
    pub buffer_count: u32,
    pub clear_color: ClearColor,
    pub sync_interval: u32,
    pub command_line: CommandLine,
}

impl SampleConfig {
    pub fn from_command_line(title: impl Into<String>, command_line: CommandLine) -> Self {
        let mut title = title.into();
        if command_line.use_warp_device {
            title.push_str(" (WARP)");
        }

        Self {
            title,
            window_size: DEFAULT_WINDOW_SIZE,
            buffer_count: DEFAULT_BUFFER_COUNT,
            clear_color: ClearColor::default(),
            sync_interval: 1,
            command_line,
        }
    }
}

/// Top-left corner that centers a window of `window` size on a screen of
/// `screen` size. Windows larger than the screen are pinned to the origin.
pub fn centered_origin(screen: (i32, i32), window: (i32, i32)) -> (i32, i32) {
    (
        ((screen.0 - window.0) / 2).max(0),
        ((screen.1 - window.1) / 2).max(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centers_on_screen() {
        assert_eq!(centered_origin((1920, 1080), (1024, 576)), (448, 252));
        assert_eq!(centered_origin((1024, 576), (1024, 576)), (0, 0));
    }

    #[test]
    fn oversized_window_is_pinned_to_origin() {
        assert_eq!(centered_origin((800, 600), (1024, 576)), (0, 12));
    }

    #[test]
    fn parses_both_prefixes_ignoring_case() {
        assert!(CommandLine::parse(["-warp"]).use_warp_device);
        assert!(CommandLine::parse(["/WARP"]).use_warp_device);
        assert!(CommandLine::parse(["-NoDebug"]).disable_debug_layer);
    }

    #[test]
    fn unknown_arguments_are_ignored() {
        let command_line = CommandLine::parse(["--fullscreen", "warp2", "-warp"]);
        assert_eq!(
            command_line,
            CommandLine {
                use_warp_device: true,
                disable_debug_layer: false,
            }
        );
    }

    #[test]
    fn flags_need_a_prefix() {
        assert_eq!(CommandLine::parse(["warp", "nodebug"]), CommandLine::default());
    }

    #[test]
    fn no_arguments_means_hardware_adapter() {
        let command_line = CommandLine::parse(Vec::<String>::new());
        assert!(!command_line.use_warp_device);
        assert_eq!(command_line.debug_layer_enabled(), cfg!(debug_assertions));
    }

    #[test]
    fn nodebug_disables_debug_layer() {
        assert!(!CommandLine::parse(["-nodebug"]).debug_layer_enabled());
    }

    #[test]
    fn config_defaults() {
        let config = SampleConfig::from_command_line("Probe", CommandLine::default());
        assert_eq!(config.title, "Probe");
        assert_eq!(config.window_size, (1024, 576));
        assert_eq!(config.buffer_count, 2);
        assert_eq!(config.sync_interval, 1);
        assert_eq!(config.clear_color.as_array(), &[0.4, 0.6, 0.9, 1.0]);
    }

    #[test]
    fn warp_is_marked_in_the_title() {
        let command_line = CommandLine::parse(["-warp"]);
        let config = SampleConfig::from_command_line("Probe", command_line);
        assert_eq!(config.title, "Probe (WARP)");
    }
}
