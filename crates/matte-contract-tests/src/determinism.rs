#[cfg(test)]
mod tests {
    use matte_graph::build_material;
    use matte_image::ImageHandle;

    /// Determinism contract:
    /// building the same material twice yields identical graphs, down to the
    /// node ids, port ids, and edge set. Stable-name lookups therefore resolve
    /// to the same nodes across rebuilds.
    #[test]
    fn material_build_is_deterministic_for_same_inputs() {
        let image = ImageHandle(7);
        let mask = ImageHandle(8);

        let a = build_material(image, Some(mask), false).expect("build 1");
        let b = build_material(image, Some(mask), false).expect("build 2");
        assert_eq!(a.graph, b.graph, "masked emission graphs must be identical");

        let a = build_material(image, None, true).expect("build 3");
        let b = build_material(image, None, true).expect("build 4");
        assert_eq!(a.graph, b.graph, "maskless pbr graphs must be identical");
    }

    /// The shading-model switch changes the graph; everything else equal, the
    /// two variants must not compare equal.
    #[test]
    fn shading_model_is_part_of_the_graph() {
        let image = ImageHandle(1);
        let emission = build_material(image, None, false).expect("emission");
        let pbr = build_material(image, None, true).expect("pbr");
        assert_ne!(emission.graph, pbr.graph);
    }
}
