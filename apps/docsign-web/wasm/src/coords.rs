//! Coordinate transformation between DOM and PDF coordinate systems

/// Convert DOM coordinates (top-left origin, pixels) to PDF coordinates (bottom-left origin, points)
pub fn dom_to_pdf(
    dom_x: f64,
    dom_y: f64,
    container_width: f64,
    container_height: f64,
    media_box: [f64; 4],
) -> (f64, f64) {
    let [mb_x, mb_y, mb_width, mb_height] = media_box;

    // Convert to percentage
    let x_pct = dom_x / container_width;
    let y_pct = dom_y / container_height;

    // Convert to PDF coordinates (flip Y axis)
    let pdf_x = mb_x + (x_pct * mb_width);
    let pdf_y = mb_y + (mb_height - (y_pct * mb_height));

    (pdf_x, pdf_y)
}

/// Convert PDF coordinates to DOM coordinates
pub fn pdf_to_dom(
    pdf_x: f64,
    pdf_y: f64,
    container_width: f64,
    container_height: f64,
    media_box: [f64; 4],
) -> (f64, f64) {
    let [mb_x, mb_y, mb_width, mb_height] = media_box;

    // Convert to percentage
    let x_pct = (pdf_x - mb_x) / mb_width;
    let y_pct = 1.0 - ((pdf_y - mb_y) / mb_height); // Flip Y axis

    // Convert to DOM coordinates
    let dom_x = x_pct * container_width;
    let dom_y = y_pct * container_height;

    (dom_x, dom_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dom_to_pdf_center() {
        let media_box = [0.0, 0.0, 612.0, 792.0]; // Letter size
        let (pdf_x, pdf_y) = dom_to_pdf(300.0, 396.0, 600.0, 792.0, media_box);
        assert!((pdf_x - 306.0).abs() < 0.1);
        assert!((pdf_y - 396.0).abs() < 0.1);
    }

    #[test]
    fn test_corners() {
        let media_box = [0.0, 0.0, 612.0, 792.0];
        let container = (600.0, 800.0);

        // Top-left DOM (0, 0) should map to top-left PDF (0, 792)
        let (x, y) = dom_to_pdf(0.0, 0.0, container.0, container.1, media_box);
        assert!((x - 0.0).abs() < 0.1);
        assert!((y - 792.0).abs() < 0.1);

        // Bottom-right DOM should map to bottom-right PDF
        let (x, y) = dom_to_pdf(
            container.0,
            container.1,
            container.0,
            container.1,
            media_box,
        );
        assert!((x - 612.0).abs() < 0.1);
        assert!((y - 0.0).abs() < 0.1);
    }

    #[test]
    fn test_overlay_coordinates_round_trip() {
        let pdf_coord = (100.0, 200.0);
        let page_height = 792.0; // Letter size
        let page_width = 612.0;
        let scale = 1.5;
        let container_width = page_width * scale;
        let container_height = page_height * scale;
        let media_box = [0.0, 0.0, page_width, page_height];

        let dom = pdf_to_dom(
            pdf_coord.0,
            pdf_coord.1,
            container_width,
            container_height,
            media_box,
        );
        let back = dom_to_pdf(dom.0, dom.1, container_width, container_height, media_box);
        assert!((back.0 - pdf_coord.0).abs() < 0.001);
        assert!((back.1 - pdf_coord.1).abs() < 0.001);
    }

    #[test]
    fn test_y_axis_flip() {
        // PDF origin is bottom-left, DOM origin is top-left
        let pdf_y = 100.0;
        let page_height = 792.0;
        let page_width = 612.0;
        let scale = 1.0;
        let container_width = page_width * scale;
        let container_height = page_height * scale;
        let media_box = [0.0, 0.0, page_width, page_height];

        let dom = pdf_to_dom(0.0, pdf_y, container_width, container_height, media_box);
        // DOM y should be (792 - 100) * 1.0 = 692
        assert_eq!(dom.1, 692.0);
    }
}
