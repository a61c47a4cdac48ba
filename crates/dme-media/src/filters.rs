//! Video filter chain construction.
//!
//! The chain order is fixed: crop, smoothing, scale, aspect. Reordering
//! changes the picture (blurring before vs. after the scale, for one).

use dme_models::TranscodeRequest;

/// Build filter for cropping right half of video.
pub fn filter_crop_right_half() -> &'static str {
    "crop=iw/2:ih:iw/2:0"
}

/// Build Gaussian blur filter.
pub fn filter_gaussian_blur(sigma: f64) -> String {
    format!("gblur=sigma={}", sigma)
}

/// Build edge-preserving bilateral filter.
pub fn filter_bilateral(sigma_s: f64, sigma_r: f64) -> String {
    format!("bilateral=sigmaS={}:sigmaR={}", sigma_s, sigma_r)
}

/// Build filter for scaling to a square frame.
pub fn filter_square_scale(size: u32) -> String {
    format!("scale={}:{}", size, size)
}

/// Build display aspect ratio override filter.
pub fn filter_set_dar(ratio: &str) -> String {
    format!("setdar={}", ratio)
}

/// Ordered filter list for a request.
pub fn build_filter_chain(request: &TranscodeRequest) -> Vec<String> {
    let mut chain = vec![filter_crop_right_half().to_string()];

    if request.use_filter {
        chain.push(filter_gaussian_blur(request.blur));
        chain.push(filter_bilateral(request.blur, request.sigma_r));
    }

    if let Some(size) = request.resolution.target_size() {
        chain.push(filter_square_scale(size));
    }

    if let Some(ratio) = request.aspect.as_ratio() {
        chain.push(filter_set_dar(ratio));
    }

    chain
}

/// The chain as a single `-vf` argument.
pub fn build_video_filter(request: &TranscodeRequest) -> String {
    build_filter_chain(request).join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use dme_models::{AspectOverride, ResolutionMode};

    fn request() -> TranscodeRequest {
        TranscodeRequest::new("in.mp4", "/out")
    }

    #[test]
    fn test_crop_only_chain() {
        assert_eq!(build_video_filter(&request()), "crop=iw/2:ih:iw/2:0");
    }

    #[test]
    fn test_full_chain_order() {
        let req = request()
            .with_filter(0.5, 0.02)
            .with_resolution(ResolutionMode::Square512);

        assert_eq!(
            build_filter_chain(&req),
            vec![
                "crop=iw/2:ih:iw/2:0",
                "gblur=sigma=0.5",
                "bilateral=sigmaS=0.5:sigmaR=0.02",
                "scale=512:512",
            ]
        );
    }

    #[test]
    fn test_disabled_filter_ignores_strengths() {
        let mut req = request();
        req.blur = 1.5;
        req.sigma_r = 0.035;

        let vf = build_video_filter(&req);
        assert!(!vf.contains("gblur"));
        assert!(!vf.contains("bilateral"));
    }

    #[test]
    fn test_aspect_override_is_last() {
        let req = request()
            .with_resolution(ResolutionMode::Square392)
            .with_aspect(AspectOverride::ratio(16, 9));

        let chain = build_filter_chain(&req);
        assert_eq!(chain.first().map(String::as_str), Some("crop=iw/2:ih:iw/2:0"));
        assert_eq!(chain.last().map(String::as_str), Some("setdar=16/9"));
        assert_eq!(chain.len(), 3);
    }

    #[test]
    fn test_decimal_aspect_passes_through() {
        let aspect: AspectOverride = "2.35:1".parse().unwrap();
        let req = request().with_aspect(aspect);
        assert_eq!(build_video_filter(&req), "crop=iw/2:ih:iw/2:0,setdar=2.35/1");

        let req = request().with_aspect("1.7778".parse().unwrap());
        assert_eq!(build_filter_chain(&req).last().map(String::as_str), Some("setdar=1.7778"));
    }

    #[test]
    fn test_crop_always_first() {
        for resolution in ResolutionMode::ALL {
            for use_filter in [false, true] {
                let mut req = request().with_resolution(*resolution);
                req.use_filter = use_filter;
                assert_eq!(build_filter_chain(&req)[0], filter_crop_right_half());
            }
        }
    }
}
