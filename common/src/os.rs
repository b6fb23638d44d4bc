use windows::{
    core::{s, PCSTR},
    Win32::{
        Foundation::{HWND, LPARAM, LRESULT, RECT, WPARAM},
        System::LibraryLoader::GetModuleHandleA,
        UI::{
            Input::KeyboardAndMouse::VK_ESCAPE,
            WindowsAndMessaging::{
                AdjustWindowRect, CreateWindowExA, DefWindowProcA, DestroyWindow,
                DispatchMessageA, GetClientRect, GetSystemMetrics, LoadCursorA, MessageBoxA,
                PeekMessageA, PostQuitMessage, RegisterClassExA, ShowWindow, TranslateMessage,
                CS_HREDRAW, CS_VREDRAW, IDC_ARROW, MB_ICONERROR, MSG, PM_REMOVE, SM_CXSCREEN,
                SM_CYSCREEN, SW_HIDE, SW_SHOW, WINDOW_STYLE, WM_DESTROY, WM_KEYDOWN, WM_KEYUP,
                WM_QUIT, WNDCLASSEXA, WS_MINIMIZEBOX, WS_SYSMENU,
            },
        },
    },
};

use crate::{
    config::{centered_origin, SampleConfig},
    util::AsCString,
    Error, Result,
};

const WINDOW_STYLE_FIXED: WINDOW_STYLE = WINDOW_STYLE(WS_SYSMENU.0 | WS_MINIMIZEBOX.0);

pub struct Window {
    hwnd: HWND,
}

impl Window {
    fn new(title: &str, client_size: (i32, i32)) -> Result<Self> {
        let instance = unsafe { GetModuleHandleA(None) }?;

        let class_name = s!("DeviceProbeClass");

        let wc = WNDCLASSEXA {
            cbSize: std::mem::size_of::<WNDCLASSEXA>() as u32,
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(wndproc),
            hInstance: instance.into(),
            hCursor: unsafe { LoadCursorA(None, PCSTR(IDC_ARROW.0 as _)) }?,
            lpszClassName: class_name,
            ..Default::default()
        };

        if unsafe { RegisterClassExA(&wc) } == 0 {
            return Err(Error::Window(
                "DeviceProbeClass is already registered".into(),
            ));
        }

        // Grow the outer rect so the client area is exactly the requested size.
        let mut window_rect = RECT {
            left: 0,
            top: 0,
            right: client_size.0,
            bottom: client_size.1,
        };
        unsafe { AdjustWindowRect(&mut window_rect, WINDOW_STYLE_FIXED, false) }?;
        let outer_size = (
            window_rect.right - window_rect.left,
            window_rect.bottom - window_rect.top,
        );

        let screen_size = unsafe { (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN)) };
        let (x, y) = centered_origin(screen_size, outer_size);

        let title = title.as_c_string();

        let hwnd = unsafe {
            CreateWindowExA(
                Default::default(),
                class_name,
                PCSTR(title.as_ptr() as _),
                WINDOW_STYLE_FIXED,
                x,
                y,
                outer_size.0,
                outer_size.1,
                None, // No parent window.
                None, // No menus.
                instance,
                None, // No window data.
            )
        }?;

        if hwnd == HWND::default() {
            return Err(Error::Window("failed to create a window handle".into()));
        }

        log::debug!("created {}x{} window at ({x}, {y})", outer_size.0, outer_size.1);

        Ok(Self { hwnd })
    }

    pub fn get_handle(&self) -> HWND {
        self.hwnd
    }

    pub fn get_physical_size(&self) -> (i32, i32) {
        let mut window_rect = RECT::default();
        if let Err(e) = unsafe { GetClientRect(self.hwnd, &mut window_rect) } {
            log::warn!("failed to get client rect {e}");
        }

        (
            window_rect.right - window_rect.left,
            window_rect.bottom - window_rect.top,
        )
    }

    pub fn set_visible(&self, visible: bool) {
        let show = if visible { SW_SHOW } else { SW_HIDE };
        let _ = unsafe { ShowWindow(self.hwnd, show) };
    }
}

pub struct App {
    exit_code: i32,
}

impl App {
    pub fn init(config: &SampleConfig) -> Result<(App, Window)> {
        let app = App { exit_code: 0 };

        let window = Window::new(&config.title, config.window_size)?;
        window.set_visible(true);

        Ok((app, window))
    }

    /// Drains pending messages. Returns `false` once the window has quit.
    pub fn run(&mut self) -> bool {
        let mut message = MSG::default();
        while unsafe { PeekMessageA(&mut message, None, 0, 0, PM_REMOVE).as_bool() } {
            unsafe {
                let _ = TranslateMessage(&message);
                DispatchMessageA(&message);
            }

            if message.message == WM_QUIT {
                self.exit_code = message.wParam.0 as i32;
                return false;
            }
        }

        true
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }
}

pub fn show_error_box(title: &str, text: &str) {
    let title = title.as_c_string();
    let text = text.as_c_string();
    unsafe {
        MessageBoxA(
            None,
            PCSTR(text.as_ptr() as _),
            PCSTR(title.as_ptr() as _),
            MB_ICONERROR,
        );
    }
}

extern "system" fn wndproc(hwnd: HWND, message: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    match message {
        WM_KEYDOWN if wparam.0 == VK_ESCAPE.0 as usize => {
            log::info!("escape pressed, closing window");
            if let Err(e) = unsafe { DestroyWindow(hwnd) } {
                log::error!("failed to destroy window {e}");
            }
            LRESULT::default()
        }

        WM_KEYDOWN | WM_KEYUP => {
            log::trace!(
                "key {} {}",
                wparam.0 as u8,
                if message == WM_KEYDOWN { "down" } else { "up" }
            );
            LRESULT::default()
        }

        WM_DESTROY => {
            unsafe { PostQuitMessage(0) };
            LRESULT::default()
        }

        _ => unsafe { DefWindowProcA(hwnd, message, wparam, lparam) },
    }
}
