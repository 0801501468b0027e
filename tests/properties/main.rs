mod expansion_props;
mod fusion_props;
