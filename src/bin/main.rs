#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use core::{cell::RefCell, fmt::Write as _};

use critical_section::Mutex;
use embassy_executor::Spawner;
use embassy_net::Stack;
use embassy_time::{Duration as EmbassyDuration, Timer, WithTimeout};
use embedded_hal_bus::spi::ExclusiveDevice;
use esp_hal::{
    clock::CpuClock,
    delay::Delay,
    gpio::{DriveMode, Input, InputConfig, Io, Level, Output, OutputConfig, Pull},
    handler,
    ledc::{
        LSGlobalClkSource, Ledc, LowSpeed,
        channel::{self, ChannelIFace},
        timer::{self, TimerIFace},
    },
    spi::{
        Mode,
        master::{Config as SpiConfig, Spi},
    },
    time::{Instant, Rate},
    timer::timg::TimerGroup,
};
use esp_radio::wifi::{ClientConfig, ModeConfig, WifiController};
use heapless::String as HeaplessString;
use log::{LevelFilter, info};
use mipidsi::{
    Builder,
    interface::SpiInterface,
    models::ILI9341Rgb565,
    options::{ColorOrder, Orientation, Rotation},
};
use nowplaying_core::{
    app::{NowPlayingApp, NowPlayingConfig, TickResult},
    input::{EncoderConfig, SharedInput},
    playback::PollGate,
    provisioning::ProvisioningMessage,
    render::Surface,
};
use nowplaying_hal_esp32::{
    input::rotary::RotaryInterrupts,
    network::{ConnectivityHandle, WifiConfig},
    platform::display::TftSurface,
};
use static_cell::StaticCell;

use offline::{OfflineArtwork, OfflinePlayback};

#[path = "main/credentials.rs"]
mod credentials;
#[path = "main/offline.rs"]
mod offline;

const PANEL_WIDTH: u16 = 240;
const PANEL_HEIGHT: u16 = 320;
const DISPLAY_SPI_MHZ: u32 = 40;
const BACKLIGHT_PWM_KHZ: u32 = 5;
const ENCODER_DIRECTION_INVERTED: bool = false;
const ALLOW_UNLIKE: bool = false;
const UI_LOOP_INTERVAL_MS: u64 = 1;
const WIFI_RETRY_BACKOFF_MIN_SECS: u64 = 2;
const WIFI_RETRY_BACKOFF_MAX_SECS: u64 = 120;
const NETWORK_POLL_INTERVAL_MS: u64 = 500;
const DHCP_TIMEOUT_SECS: u64 = 15;

const WIFI_SSID: &str = env!(
    "NOWPLAYING_WIFI_SSID",
    "Set NOWPLAYING_WIFI_SSID in your environment before building/flashing."
);
const WIFI_PASSWORD: &str = env!(
    "NOWPLAYING_WIFI_PASSWORD",
    "Set NOWPLAYING_WIFI_PASSWORD in your environment before building/flashing."
);
const WIFI_CONFIG: WifiConfig = WifiConfig::new(WIFI_SSID, WIFI_PASSWORD);

const ENCODER_CONFIG: EncoderConfig =
    EncoderConfig::new().with_direction_inverted(ENCODER_DIRECTION_INVERTED);

type EncoderPins = RotaryInterrupts<Input<'static>, Input<'static>, Input<'static>>;

static INPUT: SharedInput = SharedInput::new(ENCODER_CONFIG);
static ENCODER: Mutex<RefCell<Option<EncoderPins>>> = Mutex::new(RefCell::new(None));
static POLL_GATE: PollGate = PollGate::new();
static CONNECTIVITY: ConnectivityHandle = ConnectivityHandle::new();
static NET_RESOURCES: StaticCell<embassy_net::StackResources<3>> = StaticCell::new();

#[panic_handler]
fn panic(_: &core::panic::PanicInfo) -> ! {
    loop {}
}

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

/// Shared clock for the interrupt handler and the UI loop.
fn now_ms() -> u64 {
    Instant::now().duration_since_epoch().as_millis()
}

#[handler]
fn encoder_interrupt() {
    critical_section::with(|cs| {
        if let Some(encoder) = ENCODER.borrow_ref_mut(cs).as_mut() {
            // A failed pin read drops this edge; the next one resynchronizes.
            let _ = encoder.service(now_ms());
        }
    });
}

async fn halt() -> ! {
    loop {
        Timer::after_secs(1).await;
    }
}

fn wifi_retry_backoff_secs(consecutive_failures: u32) -> u64 {
    // 2, 4, 8, 16, 32, 64, 120, 120, ...
    let shift = consecutive_failures.min(6);
    WIFI_RETRY_BACKOFF_MIN_SECS
        .saturating_mul(1u64 << shift)
        .min(WIFI_RETRY_BACKOFF_MAX_SECS)
}

async fn wait_before_wifi_retry(consecutive_failures: &mut u32) {
    let delay_secs = wifi_retry_backoff_secs(*consecutive_failures);
    *consecutive_failures = consecutive_failures.saturating_add(1);
    info!(
        "wifi retrying in {}s (consecutive_failures={})",
        delay_secs, *consecutive_failures
    );
    Timer::after_secs(delay_secs).await;
}

async fn wifi_connection_loop(
    wifi_controller: &mut WifiController<'_>,
    stack: Stack<'_>,
    connectivity: &'static ConnectivityHandle,
) -> ! {
    let mut consecutive_failures = 0u32;

    loop {
        connectivity.mark_connecting();

        if !wifi_controller.is_started().unwrap_or(false)
            && let Err(err) = wifi_controller.start_async().await
        {
            info!("wifi start failed: {:?}", err);
            connectivity.mark_disconnected();
            wait_before_wifi_retry(&mut consecutive_failures).await;
            continue;
        }

        if let Err(err) = wifi_controller.connect_async().await {
            info!("wifi connect failed: {:?}", err);
            connectivity.mark_disconnected();
            let _ = wifi_controller.disconnect_async().await;
            wait_before_wifi_retry(&mut consecutive_failures).await;
            continue;
        }

        if stack
            .wait_config_up()
            .with_timeout(EmbassyDuration::from_secs(DHCP_TIMEOUT_SECS))
            .await
            .is_err()
        {
            info!("dhcp timeout; forcing reconnect");
            connectivity.update_link_ip(stack.is_link_up(), false);
            let _ = wifi_controller.disconnect_async().await;
            wait_before_wifi_retry(&mut consecutive_failures).await;
            continue;
        }

        connectivity.update_link_ip(stack.is_link_up(), stack.config_v4().is_some());
        info!("wifi connected and dhcp ready");
        consecutive_failures = 0;

        loop {
            let link_up = stack.is_link_up();
            let has_ipv4 = stack.config_v4().is_some();
            let is_connected = matches!(wifi_controller.is_connected(), Ok(true));

            connectivity.update_link_ip(link_up, has_ipv4);

            if !(link_up && has_ipv4 && is_connected) {
                info!(
                    "wifi state lost (link_up={} has_ipv4={} connected={}); reconnecting",
                    link_up, has_ipv4, is_connected
                );
                break;
            }

            Timer::after_millis(NETWORK_POLL_INTERVAL_MS).await;
        }

        connectivity.mark_disconnected();
        let _ = wifi_controller.disconnect_async().await;
        wait_before_wifi_retry(&mut consecutive_failures).await;
    }
}

/// Address shown on the authorization screen, once DHCP has assigned one.
fn authorization_address(stack: Stack<'_>) -> Option<HeaplessString<32>> {
    let config = stack.config_v4()?;
    let mut address = HeaplessString::new();
    write!(address, "http://{}", config.address.address()).ok()?;
    Some(address)
}

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    esp_println::logger::init_logger(LevelFilter::Info);
    esp_println::println!("boot: nowplaying starting");

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // esp-radio requires an allocator.
    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 65536);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // Encoder wiring: CLK=GPIO4, DT=GPIO16, SW=GPIO17
    let mut io = Io::new(peripherals.IO_MUX);
    io.set_interrupt_handler(encoder_interrupt);

    let input_cfg = InputConfig::default().with_pull(Pull::Up);
    let encoder_clk = Input::new(peripherals.GPIO4, input_cfg);
    let encoder_dt = Input::new(peripherals.GPIO16, input_cfg);
    let encoder_sw = Input::new(peripherals.GPIO17, input_cfg);

    let encoder_ready = critical_section::with(|cs| {
        match RotaryInterrupts::new(encoder_clk, encoder_dt, encoder_sw, ENCODER_CONFIG, &INPUT) {
            Ok(encoder) => {
                ENCODER.borrow_ref_mut(cs).replace(encoder);
                true
            }
            Err(err) => {
                info!("encoder init failed: {:?}", err);
                false
            }
        }
    });
    if !encoder_ready {
        halt().await;
    }

    // TFT wiring: SCK=GPIO14, MOSI=GPIO13, MISO=GPIO12, CS=GPIO15, DC=GPIO2
    let spi = match Spi::new(
        peripherals.SPI2,
        SpiConfig::default()
            .with_frequency(Rate::from_mhz(DISPLAY_SPI_MHZ))
            .with_mode(Mode::_0),
    ) {
        Ok(spi) => spi
            .with_sck(peripherals.GPIO14)
            .with_mosi(peripherals.GPIO13)
            .with_miso(peripherals.GPIO12),
        Err(err) => {
            info!("display spi config failed: {:?}", err);
            halt().await
        }
    };
    let cs = Output::new(peripherals.GPIO15, Level::High, OutputConfig::default());
    let dc = Output::new(peripherals.GPIO2, Level::Low, OutputConfig::default());

    let spi_device = match ExclusiveDevice::new(spi, cs, Delay::new()) {
        Ok(device) => device,
        Err(err) => {
            info!("display cs init failed: {:?}", err);
            halt().await
        }
    };

    // mipidsi batches pixel writes through this buffer.
    let mut di_buffer = [0u8; 512];
    let di = SpiInterface::new(spi_device, dc, &mut di_buffer);

    let mut delay = Delay::new();
    let display = match Builder::new(ILI9341Rgb565, di)
        .display_size(PANEL_WIDTH, PANEL_HEIGHT)
        .orientation(Orientation::new().rotate(Rotation::Deg90))
        .color_order(ColorOrder::Bgr)
        .init(&mut delay)
    {
        Ok(display) => display,
        Err(err) => {
            info!("display init failed: {:?}", err);
            halt().await
        }
    };

    // Backlight: LEDC low-speed channel 0 on GPIO21. The panel stays dark
    // but usable when PWM setup fails.
    let mut ledc = Ledc::new(peripherals.LEDC);
    ledc.set_global_slow_clock(LSGlobalClkSource::APBClk);
    let mut backlight_timer = ledc.timer::<LowSpeed>(timer::Number::Timer0);
    let backlight = match backlight_timer.configure(timer::config::Config {
        duty: timer::config::Duty::Duty8Bit,
        clock_source: timer::LSClockSource::APBClk,
        frequency: Rate::from_khz(BACKLIGHT_PWM_KHZ),
    }) {
        Ok(()) => {
            let mut backlight = ledc.channel(channel::Number::Channel0, peripherals.GPIO21);
            match backlight.configure(channel::config::Config {
                timer: &backlight_timer,
                duty_pct: 0,
                drive_mode: DriveMode::PushPull,
            }) {
                Ok(()) => Some(backlight),
                Err(err) => {
                    info!("backlight channel config failed: {:?}", err);
                    None
                }
            }
        }
        Err(err) => {
            info!("backlight timer config failed: {:?}", err);
            None
        }
    };

    let mut surface = TftSurface::new(display, backlight);

    let authorized = credentials::load_credentials()
        .is_some_and(|credentials| credentials.has_refresh_token());

    let app_config = NowPlayingConfig {
        allow_unlike: ALLOW_UNLIKE,
        encoder: ENCODER_CONFIG,
        ..NowPlayingConfig::default()
    };
    let mut app = NowPlayingApp::new(
        OfflinePlayback,
        OfflineArtwork,
        &INPUT,
        &POLL_GATE,
        app_config,
        surface.size(),
    );
    app.begin(&mut surface);

    let radio = match esp_radio::init() {
        Ok(radio) => radio,
        Err(err) => {
            info!("esp-radio init failed: {:?}", err);
            halt().await
        }
    };

    let (mut wifi_controller, interfaces) =
        match esp_radio::wifi::new(&radio, peripherals.WIFI, esp_radio::wifi::Config::default()) {
            Ok(parts) => parts,
            Err(err) => {
                info!("wifi peripheral init failed: {:?}", err);
                halt().await
            }
        };

    let client_config = ClientConfig::default()
        .with_ssid(WIFI_CONFIG.ssid.into())
        .with_password(WIFI_CONFIG.password.into());
    let wifi_mode = ModeConfig::Client(client_config);
    if let Err(err) = wifi_controller.set_config(&wifi_mode) {
        info!("wifi mode config failed: {:?}", err);
        halt().await;
    }

    let stack_config = embassy_net::Config::dhcpv4(Default::default());
    let (stack, mut net_runner) = embassy_net::new(
        interfaces.sta,
        stack_config,
        NET_RESOURCES.init(embassy_net::StackResources::<3>::new()),
        0x4E50_1A2B_3C4D_5E6F,
    );

    info!(
        "Now playing started: request_interval_ms={} progress_interval_ms={} allow_unlike={} authorized={}",
        app_config.request_interval_ms,
        app_config.progress_interval_ms,
        app_config.allow_unlike,
        authorized
    );
    info!("Display pins: SCK=GPIO14 MOSI=GPIO13 MISO=GPIO12 CS=GPIO15 DC=GPIO2 BL=GPIO21");
    info!("Encoder pins: CLK=GPIO4 DT=GPIO16 SW=GPIO17");

    CONNECTIVITY.mark_connecting();

    let net_future = net_runner.run();
    let wifi_future = wifi_connection_loop(&mut wifi_controller, stack, &CONNECTIVITY);
    let ui_future = async {
        let mut last_connectivity_revision = u32::MAX;
        let mut display_fault_logged = false;
        let mut first_render_logged = false;
        let mut authorization_prompt_shown = false;

        loop {
            let connectivity = CONNECTIVITY.snapshot();
            if connectivity.revision != last_connectivity_revision {
                info!(
                    "connectivity: state={:?} online={}",
                    connectivity.state,
                    connectivity.online()
                );
                app.set_online(connectivity.online());
                last_connectivity_revision = connectivity.revision;
            }

            if authorized {
                if app.tick(now_ms(), &mut surface, &mut delay) == TickResult::Rendered
                    && !first_render_logged
                {
                    info!("display: first now-playing render");
                    first_render_logged = true;
                }
            } else if !authorization_prompt_shown
                && connectivity.online()
                && let Some(address) = authorization_address(stack)
            {
                ProvisioningMessage::RefreshToken { address: &address }.render(&mut surface);
                authorization_prompt_shown = true;
            }

            if let Some(err) = surface.take_fault()
                && !display_fault_logged
            {
                info!("display fault: {:?}", err);
                display_fault_logged = true;
            }

            Timer::after_millis(UI_LOOP_INTERVAL_MS).await;
        }
    };

    let _ = embassy_futures::join::join3(net_future, wifi_future, ui_future).await;
    unreachable!()
}
