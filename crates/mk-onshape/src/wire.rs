//! Feature-definition payload encoding

use mk_core::{
    ExtrudeOperation, FeatureDefinition, RegionRef, ServiceError, ServiceResult, SketchCircle,
    SketchPlane,
};
use serde_json::{Value, json};

use crate::units::LengthUnit;

/// Deterministic ID of a default plane
pub fn plane_id(plane: SketchPlane) -> &'static str {
    match plane {
        SketchPlane::Top => "JDC",
        SketchPlane::Front => "JCC",
        SketchPlane::Right => "JEC",
    }
}

/// Encode a resolved definition as a feature-definition call
///
/// Definitions that still carry a preceding-sketch placeholder are refused.
pub fn encode_feature(definition: &FeatureDefinition, units: LengthUnit) -> ServiceResult<Value> {
    let feature = match definition {
        FeatureDefinition::Sketch {
            name,
            plane,
            circles,
        } => sketch(name, *plane, circles, units),
        FeatureDefinition::Extrude {
            name,
            region,
            depth,
            operation,
            opposite_direction,
        } => {
            let RegionRef::Sketch(sketch_id) = region else {
                return Err(ServiceError::UnresolvedReference(name.clone()));
            };
            extrude(name, sketch_id, *depth, *operation, *opposite_direction, units)
        }
        FeatureDefinition::Fillet {
            name,
            edges,
            radius,
        } => fillet(name, edges, *radius, units),
    };

    Ok(json!({
        "btType": "BTFeatureDefinitionCall-1406",
        "feature": feature,
    }))
}

fn sketch(name: &str, plane: SketchPlane, circles: &[SketchCircle], units: LengthUnit) -> Value {
    let entities: Vec<Value> = circles
        .iter()
        .enumerate()
        .map(|(i, circle)| {
            json!({
                "btType": "BTMSketchCurve-4",
                "entityId": format!("circle-{}", i),
                "isConstruction": false,
                "parameters": [],
                "geometry": {
                    "btType": "BTCurveGeometryCircle-115",
                    "radius": units.to_meters(circle.radius),
                    "xCenter": units.to_meters(circle.center.x),
                    "yCenter": units.to_meters(circle.center.y),
                    "xDir": 1.0,
                    "yDir": 0.0,
                    "clockwise": false,
                },
            })
        })
        .collect();

    json!({
        "btType": "BTMSketch-151",
        "featureType": "newSketch",
        "name": name,
        "suppressed": false,
        "namespace": "",
        "parameters": [
            {
                "btType": "BTMParameterQueryList-148",
                "queries": [
                    {
                        "btType": "BTMIndividualQuery-138",
                        "deterministicIds": [plane_id(plane)],
                    }
                ],
                "parameterId": "sketchPlane",
                "parameterName": "",
                "libraryRelationType": "NONE",
            }
        ],
        "entities": entities,
        "constraints": [],
    })
}

fn extrude(
    name: &str,
    sketch_id: &str,
    depth: f64,
    operation: ExtrudeOperation,
    opposite_direction: bool,
    units: LengthUnit,
) -> Value {
    json!({
        "btType": "BTMFeature-134",
        "featureType": "extrude",
        "name": name,
        "suppressed": false,
        "namespace": "",
        "parameters": [
            {
                "btType": "BTMParameterQueryList-148",
                "queries": [
                    {
                        "btType": "BTMIndividualSketchRegionQuery-140",
                        "queryStatement": null,
                        "filterInnerLoops": true,
                        "queryString": format!("query = qSketchRegion(id + \"{}\", true);", sketch_id),
                        "featureId": sketch_id,
                        "deterministicIds": [],
                    }
                ],
                "parameterId": "entities",
                "parameterName": "",
                "libraryRelationType": "NONE",
            },
            {
                "btType": "BTMParameterEnum-145",
                "namespace": "",
                "enumName": "NewBodyOperationType",
                "value": operation.label(),
                "parameterId": "operationType",
                "parameterName": "",
                "libraryRelationType": "NONE",
            },
            quantity("depth", depth, units),
            {
                "btType": "BTMParameterBoolean-144",
                "value": opposite_direction,
                "parameterId": "oppositeDirection",
                "parameterName": "",
                "libraryRelationType": "NONE",
            },
        ],
    })
}

fn fillet(name: &str, edges: &[String], radius: f64, units: LengthUnit) -> Value {
    json!({
        "btType": "BTMFeature-134",
        "featureType": "fillet",
        "name": name,
        "suppressed": false,
        "namespace": "",
        "parameters": [
            {
                "btType": "BTMParameterQueryList-148",
                "queries": [
                    {
                        "btType": "BTMIndividualQuery-138",
                        "deterministicIds": edges,
                    }
                ],
                "parameterId": "entities",
                "parameterName": "",
                "libraryRelationType": "NONE",
            },
            quantity("radius", radius, units),
            {
                "btType": "BTMParameterEnum-145",
                "namespace": "",
                "enumName": "FilletType",
                "value": "EDGE",
                "parameterId": "filletType",
                "parameterName": "",
                "libraryRelationType": "NONE",
            },
        ],
    })
}

fn quantity(parameter_id: &str, value: f64, units: LengthUnit) -> Value {
    json!({
        "btType": "BTMParameterQuantity-147",
        "isInteger": false,
        "value": value,
        "units": "",
        "expression": units.expression(value),
        "parameterId": parameter_id,
        "parameterName": "",
        "libraryRelationType": "NONE",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::DVec2;

    fn parameter<'a>(feature: &'a Value, id: &str) -> &'a Value {
        feature["feature"]["parameters"]
            .as_array()
            .unwrap()
            .iter()
            .find(|p| p["parameterId"] == id)
            .unwrap()
    }

    #[test]
    fn test_sketch_in_meters_on_plane() {
        let def = FeatureDefinition::circle_sketch(
            "Counterbore Sketch 1",
            SketchPlane::Front,
            DVec2::new(1.0, 2.0),
            0.5,
        );
        let payload = encode_feature(&def, LengthUnit::Inch).unwrap();

        assert_eq!(payload["btType"], "BTFeatureDefinitionCall-1406");
        assert_eq!(payload["feature"]["featureType"], "newSketch");
        assert_eq!(
            parameter(&payload, "sketchPlane")["queries"][0]["deterministicIds"][0],
            "JCC"
        );
        let geometry = &payload["feature"]["entities"][0]["geometry"];
        assert_relative_eq!(geometry["radius"].as_f64().unwrap(), 0.0127);
        assert_relative_eq!(geometry["yCenter"].as_f64().unwrap(), 0.0508);
    }

    #[test]
    fn test_extrude_references_sketch() {
        let mut def =
            FeatureDefinition::remove_extrude("Counterbore 1", RegionRef::PrecedingSketch, 0.75);
        assert!(matches!(
            encode_feature(&def, LengthUnit::Inch),
            Err(ServiceError::UnresolvedReference(name)) if name == "Counterbore 1"
        ));

        def.resolve_preceding_sketch("FAbC");
        let payload = encode_feature(&def, LengthUnit::Inch).unwrap();
        let query = &parameter(&payload, "entities")["queries"][0];
        assert_eq!(query["featureId"], "FAbC");
        assert_eq!(query["queryString"], "query = qSketchRegion(id + \"FAbC\", true);");
        assert_eq!(parameter(&payload, "operationType")["value"], "REMOVE");
        assert_eq!(parameter(&payload, "depth")["expression"], "0.75 in");
    }

    #[test]
    fn test_fillet_entities() {
        let def = FeatureDefinition::fillet("Fillet", vec!["JHH".into(), "JHP".into()], 0.02)
            .unwrap();
        let payload = encode_feature(&def, LengthUnit::Millimeter).unwrap();
        assert_eq!(
            parameter(&payload, "entities")["queries"][0]["deterministicIds"],
            json!(["JHH", "JHP"])
        );
        assert_eq!(parameter(&payload, "radius")["expression"], "0.02 mm");
    }
}
